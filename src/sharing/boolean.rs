//! Boolean secret sharing over F_2.
//!
//! Same structure as the [arithmetic engine](crate::sharing::arith) with
//! addition replaced by XOR and multiplication by AND. Each shared bit lives
//! in the low bit of a u32 cell so the two engines ride the same transport
//! codec; the high bits are zero by construction.

use crate::channel_utils::ShareChannel;
use crate::errors::Error;
use crate::party::Party;
use crate::rand_utils;
use crate::sharing::BeaverTriple;
use itertools::{izip, Itertools};
use rand::{CryptoRng, Rng};

/// Engine for XOR sharing of single bits.
#[derive(Debug, Clone, Copy, Default)]
pub struct BooleanSharing;

impl BooleanSharing {
    /// Build the engine.
    pub fn new() -> Self {
        Self
    }

    /// Split bit `v` (low bit of the cell) into two XOR shares.
    pub fn share<RNG: CryptoRng + Rng>(&self, v: u32, rng: &mut RNG) -> (u32, u32) {
        let s0 = rand_utils::gen_bit(rng);
        let s1 = (v & 1) ^ s0;
        (s0, s1)
    }

    /// Element-wise [`share`](Self::share).
    pub fn share_vec<RNG: CryptoRng + Rng>(
        &self,
        vs: &[u32],
        rng: &mut RNG,
    ) -> (Vec<u32>, Vec<u32>) {
        vs.iter().map(|&v| self.share(v, rng)).unzip()
    }

    /// Recombine a shared bit. One exchange; both sides return the bit.
    pub fn reconstruct<C: ShareChannel>(
        &self,
        party: &mut Party<C>,
        share: u32,
    ) -> Result<u32, Error> {
        let peer = party.send_recv_u32(share)?;
        Ok((share ^ peer) & 1)
    }

    /// Recombine a vector of shared bits in a single network round.
    pub fn reconstruct_vec<C: ShareChannel>(
        &self,
        party: &mut Party<C>,
        shares: &[u32],
    ) -> Result<Vec<u32>, Error> {
        let peer = party.send_recv_vec(shares)?;
        Ok(izip!(shares, &peer).map(|(&s, &p)| (s ^ p) & 1).collect_vec())
    }

    /// Dealer role: draw `n` clear boolean triples with c = a AND b.
    pub fn generate_triples<RNG: CryptoRng + Rng>(
        &self,
        n: usize,
        rng: &mut RNG,
    ) -> Vec<BeaverTriple> {
        (0..n)
            .map(|_| {
                let a = rand_utils::gen_bit(rng);
                let b = rand_utils::gen_bit(rng);
                BeaverTriple::new(a, b, a & b)
            })
            .collect_vec()
    }

    /// Dealer role: XOR-split one clear triple; c1 = c XOR c0 so the c
    /// shares recombine to a AND b.
    pub fn share_triple<RNG: CryptoRng + Rng>(
        &self,
        triple: &BeaverTriple,
        rng: &mut RNG,
    ) -> (BeaverTriple, BeaverTriple) {
        let (a0, a1) = self.share(triple.a, rng);
        let (b0, b1) = self.share(triple.b, rng);
        let (c0, c1) = self.share(triple.c, rng);
        (
            BeaverTriple::new(a0, b0, c0),
            BeaverTriple::new(a1, b1, c1),
        )
    }

    /// Dealer role: split a batch of clear triples.
    pub fn share_triples<RNG: CryptoRng + Rng>(
        &self,
        triples: &[BeaverTriple],
        rng: &mut RNG,
    ) -> (Vec<BeaverTriple>, Vec<BeaverTriple>) {
        triples.iter().map(|t| self.share_triple(t, rng)).unzip()
    }

    fn combine(&self, id: usize, triple: &BeaverTriple, d: u32, e: u32) -> u32 {
        let mut z = (e & triple.a) ^ (d & triple.b) ^ triple.c;
        if id == 0 {
            z ^= d & e;
        }
        z & 1
    }

    /// Beaver AND of two shared bits; consumes `triple`.
    pub fn and<C: ShareChannel>(
        &self,
        party: &mut Party<C>,
        triple: BeaverTriple,
        x: u32,
        y: u32,
    ) -> Result<u32, Error> {
        let own = [(x ^ triple.a) & 1, (y ^ triple.b) & 1];
        let peer = party.send_recv_array(own)?;

        let d = own[0] ^ peer[0];
        let e = own[1] ^ peer[1];

        Ok(self.combine(party.id(), &triple, d, e))
    }

    /// n ANDs in one network round of 2n masked bits.
    pub fn and_vec<C: ShareChannel>(
        &self,
        party: &mut Party<C>,
        triples: Vec<BeaverTriple>,
        xs: &[u32],
        ys: &[u32],
    ) -> Result<Vec<u32>, Error> {
        if ys.len() != xs.len() {
            return Err(Error::LengthMismatch {
                expected: xs.len(),
                actual: ys.len(),
            });
        }
        if triples.len() != xs.len() {
            return Err(Error::LengthMismatch {
                expected: xs.len(),
                actual: triples.len(),
            });
        }

        let own = izip!(xs, ys, &triples)
            .flat_map(|(&x, &y, t)| [(x ^ t.a) & 1, (y ^ t.b) & 1])
            .collect_vec();
        let peer = party.send_recv_vec(&own)?;

        let id = party.id();
        let zs = izip!(own.chunks_exact(2), peer.chunks_exact(2), &triples)
            .map(|(o, p, t)| self.combine(id, t, o[0] ^ p[0], o[1] ^ p[1]))
            .collect_vec();

        Ok(zs)
    }

    /// OR of two shared bits via x OR y = NOT(NOT x AND NOT y).
    ///
    /// In an XOR sharing the constant 1 must be added by exactly one party,
    /// so party 0 alone flips its input shares before the AND and the result
    /// share after it; party 1 runs a plain AND.
    pub fn or<C: ShareChannel>(
        &self,
        party: &mut Party<C>,
        triple: BeaverTriple,
        x: u32,
        y: u32,
    ) -> Result<u32, Error> {
        let flip = if party.id() == 0 { 1 } else { 0 };
        let z = self.and(party, triple, x ^ flip, y ^ flip)?;
        Ok(z ^ flip)
    }

    /// Element-wise [`or`](Self::or) in one network round.
    pub fn or_vec<C: ShareChannel>(
        &self,
        party: &mut Party<C>,
        triples: Vec<BeaverTriple>,
        xs: &[u32],
        ys: &[u32],
    ) -> Result<Vec<u32>, Error> {
        let flip = if party.id() == 0 { 1 } else { 0 };
        let nxs = xs.iter().map(|&x| x ^ flip).collect_vec();
        let nys = ys.iter().map(|&y| y ^ flip).collect_vec();
        let zs = self.and_vec(party, triples, &nxs, &nys)?;
        Ok(zs.into_iter().map(|z| z ^ flip).collect_vec())
    }
}
