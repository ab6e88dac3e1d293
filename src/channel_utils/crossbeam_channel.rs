//! In-process byte channels over [crossbeam]. Tests and benches use these to
//! run both parties inside one process without touching sockets.

use crossbeam::channel::{unbounded, Receiver, RecvError, SendError, Sender};
use std::collections::VecDeque;
use std::io::{Error, ErrorKind, Read, Result, Write};

/// Write half of an in-process byte channel.
#[derive(Debug)]
pub struct CrossbeamSender(Sender<Vec<u8>>);

/// Read half of an in-process byte channel.
///
/// Incoming messages are buffered so reads of any size work; the message
/// boundaries of the underlying channel are not observable.
#[derive(Debug)]
pub struct CrossbeamReceiver {
    receiver: Receiver<Vec<u8>>,
    pending: VecDeque<u8>,
}

impl Write for CrossbeamSender {
    fn write(&mut self, buf: &[u8]) -> Result<usize> {
        if let Err(SendError(v)) = self.0.send(buf.to_vec()) {
            return Err(Error::new(ErrorKind::BrokenPipe, SendError(v)));
        }

        Ok(buf.len())
    }

    fn flush(&mut self) -> Result<()> {
        Ok(())
    }
}

impl Read for CrossbeamReceiver {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        while self.pending.is_empty() {
            match self.receiver.recv() {
                Ok(v) => self.pending.extend(v),
                Err(RecvError) => return Err(Error::new(ErrorKind::BrokenPipe, RecvError)),
            }
        }

        let n = buf.len().min(self.pending.len());
        for slot in buf.iter_mut().take(n) {
            *slot = self.pending.pop_front().unwrap();
        }

        Ok(n)
    }
}

/// Create a sender/receiver pair carrying one direction of a channel.
pub fn cbch_pair() -> (CrossbeamSender, CrossbeamReceiver) {
    let (s, r) = unbounded();
    (
        CrossbeamSender(s),
        CrossbeamReceiver {
            receiver: r,
            pending: VecDeque::new(),
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel_utils::{ShareChannel, SyncChannel};

    #[test]
    fn test_pair() {
        let (mut s1, mut r1) = cbch_pair();

        let handle = std::thread::spawn(move || {
            let mut v = vec![0u8; 3];
            r1.read_exact(&mut v).unwrap();
            assert_eq!(v, [1, 2, 3]);
        });

        let v = [1, 2, 3];
        s1.write_all(&v).unwrap();

        handle.join().unwrap();
    }

    #[test]
    fn test_short_reads_span_messages() {
        let (mut s1, mut r1) = cbch_pair();

        s1.write_all(&[1, 2, 3]).unwrap();
        s1.write_all(&[4, 5]).unwrap();

        let mut v = [0u8; 4];
        r1.read_exact(&mut v).unwrap();
        assert_eq!(v, [1, 2, 3, 4]);

        let mut v = [0u8; 1];
        r1.read_exact(&mut v).unwrap();
        assert_eq!(v, [5]);
    }

    #[test]
    fn test_broken_pipe() {
        let (mut s1, mut r1) = cbch_pair();

        let handle = std::thread::spawn(move || {
            let mut v = vec![0u8; 3];
            r1.read_exact(&mut v).unwrap();
            assert_eq!(v, [1, 2, 3]);

            let mut v = vec![0u8; 3];
            let e = r1.read_exact(&mut v).unwrap_err();
            assert_eq!(e.kind(), ErrorKind::BrokenPipe);
        });

        let v = [1, 2, 3];
        s1.write_all(&v).unwrap();
        drop(s1);

        handle.join().unwrap();
    }

    #[test]
    fn test_channel() {
        let (s1, r1) = cbch_pair();
        let (s2, r2) = cbch_pair();
        let mut ch1 = SyncChannel::new(r1, s2);
        let mut ch2 = SyncChannel::new(r2, s1);

        let handle = std::thread::spawn(move || {
            let n = ch1.recv_u32().unwrap();
            assert_eq!(n, 123);
            ch1.send_u32(n * 2).unwrap();
            ch1.flush().unwrap();
        });

        let n = 123;
        ch2.send_u32(n).unwrap();
        ch2.flush().unwrap();
        let n = ch2.recv_u32().unwrap();
        assert_eq!(n, 246);

        handle.join().unwrap();
    }
}
