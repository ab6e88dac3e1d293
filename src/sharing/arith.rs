//! Additive secret sharing over the ring Z/2^k, 2 <= k <= 32.

use crate::channel_utils::ShareChannel;
use crate::errors::Error;
use crate::party::Party;
use crate::rand_utils;
use crate::sharing::BeaverTriple;
use itertools::{izip, Itertools};
use rand::{CryptoRng, Rng};

/// Smallest supported ring width.
pub const MIN_WIDTH: u32 = 2;
/// Largest supported ring width (one share per u32 cell).
pub const MAX_WIDTH: u32 = 32;

/// Engine for additive sharing over Z/2^k.
///
/// All values are canonical in the low k bits. The engine itself is pure;
/// only [`reconstruct`](Self::reconstruct) and the multiplication protocols
/// touch the network, through the [`Party`] handed in per call.
#[derive(Debug, Clone, Copy)]
pub struct ArithmeticSharing {
    width: u32,
    mask: u64,
}

impl ArithmeticSharing {
    /// Build an engine for width-k rings. Fails with
    /// [`Error::InvalidParameter`] outside [2, 32].
    pub fn new(width: u32) -> Result<Self, Error> {
        if !(MIN_WIDTH..=MAX_WIDTH).contains(&width) {
            return Err(Error::InvalidParameter(format!(
                "ring width must be in [{}, {}] (got {})",
                MIN_WIDTH, MAX_WIDTH, width
            )));
        }

        Ok(Self {
            width,
            mask: (1u64 << width) - 1,
        })
    }

    /// The ring width k.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Canonicalize to the low k bits.
    pub fn reduce(&self, x: u64) -> u32 {
        (x & self.mask) as u32
    }

    /// (x + y) mod 2^k.
    pub fn add_mod(&self, x: u32, y: u32) -> u32 {
        self.reduce(x as u64 + y as u64)
    }

    /// (x - y) mod 2^k. Wrapping subtraction is exact here because 2^k
    /// divides 2^32.
    pub fn sub_mod(&self, x: u32, y: u32) -> u32 {
        self.reduce(x.wrapping_sub(y) as u64)
    }

    /// (x * y) mod 2^k.
    pub fn mul_mod(&self, x: u32, y: u32) -> u32 {
        self.reduce((x as u64).wrapping_mul(y as u64))
    }

    /// Split `v` into two additive shares (s0, s1).
    ///
    /// s0 is uniform over [0, 2^k), which is what hides `v` from each party
    /// alone; s1 = v - s0.
    pub fn share<RNG: CryptoRng + Rng>(&self, v: u32, rng: &mut RNG) -> (u32, u32) {
        let s0 = rand_utils::gen_masked(rng, self.mask);
        let s1 = self.sub_mod(self.reduce(v as u64), s0);
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

    /// Recombine a shared value. One exchange; both sides return the same
    /// plaintext.
    pub fn reconstruct<C: ShareChannel>(
        &self,
        party: &mut Party<C>,
        share: u32,
    ) -> Result<u32, Error> {
        let peer = party.send_recv_u32(share)?;
        Ok(self.add_mod(share, peer))
    }

    /// Recombine a vector of shared values in a single network round.
    pub fn reconstruct_vec<C: ShareChannel>(
        &self,
        party: &mut Party<C>,
        shares: &[u32],
    ) -> Result<Vec<u32>, Error> {
        let peer = party.send_recv_vec(shares)?;
        Ok(izip!(shares, &peer)
            .map(|(&s, &p)| self.add_mod(s, p))
            .collect_vec())
    }

    /// Dealer role: draw `n` clear triples with c = a * b mod 2^k.
    pub fn generate_triples<RNG: CryptoRng + Rng>(
        &self,
        n: usize,
        rng: &mut RNG,
    ) -> Vec<BeaverTriple> {
        (0..n)
            .map(|_| {
                let a = rand_utils::gen_masked(rng, self.mask);
                let b = rand_utils::gen_masked(rng, self.mask);
                BeaverTriple::new(a, b, self.mul_mod(a, b))
            })
            .collect_vec()
    }

    /// Dealer role: split one clear triple into the two parties' triple
    /// shares.
    ///
    /// a and b are split with fresh randomness; the c shares are derived as
    /// c1 = c - c0 so that the shares of c recombine to a * b. Splitting c
    /// independently would break the multiplication protocol.
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

    /// Combine the revealed masks with this party's triple share. Only
    /// party 0 adds the d*e bridge term: it must enter the sum exactly once.
    fn combine(&self, id: usize, triple: &BeaverTriple, d: u32, e: u32) -> u32 {
        let mut z = self.add_mod(
            self.add_mod(self.mul_mod(e, triple.a), self.mul_mod(d, triple.b)),
            triple.c,
        );
        if id == 0 {
            z = self.add_mod(z, self.mul_mod(d, e));
        }
        z
    }

    /// Beaver multiplication of two shared values; consumes `triple`.
    ///
    /// Reveals d = x - a and e = y - b (safe: a, b are uniform masks) in one
    /// exchange, then combines locally so that z0 + z1 = x * y mod 2^k.
    pub fn multiply<C: ShareChannel>(
        &self,
        party: &mut Party<C>,
        triple: BeaverTriple,
        x: u32,
        y: u32,
    ) -> Result<u32, Error> {
        let own = [self.sub_mod(x, triple.a), self.sub_mod(y, triple.b)];
        let peer = party.send_recv_array(own)?;

        let d = self.add_mod(own[0], peer[0]);
        let e = self.add_mod(own[1], peer[1]);

        Ok(self.combine(party.id(), &triple, d, e))
    }

    /// Two independent multiplications sharing one network round.
    pub fn multiply_pair<C: ShareChannel>(
        &self,
        party: &mut Party<C>,
        triples: (BeaverTriple, BeaverTriple),
        x1: u32,
        y1: u32,
        x2: u32,
        y2: u32,
    ) -> Result<(u32, u32), Error> {
        let (t1, t2) = triples;
        let own = [
            self.sub_mod(x1, t1.a),
            self.sub_mod(y1, t1.b),
            self.sub_mod(x2, t2.a),
            self.sub_mod(y2, t2.b),
        ];
        let peer = party.send_recv_array(own)?;

        let z1 = self.combine(
            party.id(),
            &t1,
            self.add_mod(own[0], peer[0]),
            self.add_mod(own[1], peer[1]),
        );
        let z2 = self.combine(
            party.id(),
            &t2,
            self.add_mod(own[2], peer[2]),
            self.add_mod(own[3], peer[3]),
        );

        Ok((z1, z2))
    }

    /// n multiplications in one network round of 2n masked words.
    ///
    /// Consumes one triple per element; fails with [`Error::LengthMismatch`]
    /// if the operand or triple counts disagree.
    pub fn multiply_vec<C: ShareChannel>(
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
            .flat_map(|(&x, &y, t)| [self.sub_mod(x, t.a), self.sub_mod(y, t.b)])
            .collect_vec();
        let peer = party.send_recv_vec(&own)?;

        let id = party.id();
        let zs = izip!(own.chunks_exact(2), peer.chunks_exact(2), &triples)
            .map(|(o, p, t)| {
                let d = self.add_mod(o[0], p[0]);
                let e = self.add_mod(o[1], p[1]);
                self.combine(id, t, d, e)
            })
            .collect_vec();

        Ok(zs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel_utils::crossbeam_channel::{cbch_pair, CrossbeamReceiver, CrossbeamSender};
    use crate::channel_utils::SyncChannel;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    type CbChannel = SyncChannel<CrossbeamReceiver, CrossbeamSender>;

    fn party_pair() -> (Party<CbChannel>, Party<CbChannel>) {
        let (s1, r1) = cbch_pair();
        let (s2, r2) = cbch_pair();
        let p0 = Party::new(0, SyncChannel::new(r1, s2)).unwrap();
        let p1 = Party::new(1, SyncChannel::new(r2, s1)).unwrap();
        (p0, p1)
    }

    #[test]
    fn test_width_validation() {
        assert!(ArithmeticSharing::new(1).is_err());
        assert!(ArithmeticSharing::new(33).is_err());
        assert!(ArithmeticSharing::new(2).is_ok());
        assert!(ArithmeticSharing::new(32).is_ok());
    }

    #[test]
    fn test_share_recombines_locally() {
        let engine = ArithmeticSharing::new(32).unwrap();
        let mut rng = ChaCha20Rng::seed_from_u64(3);

        for _ in 0..200 {
            let v = rng.gen::<u32>();
            let (s0, s1) = engine.share(v, &mut rng);
            assert_eq!(engine.add_mod(s0, s1), v);
        }
    }

    #[test]
    fn test_share_canonical_low_bits() {
        let engine = ArithmeticSharing::new(8).unwrap();
        let mut rng = ChaCha20Rng::seed_from_u64(4);

        for _ in 0..200 {
            let v = rng.gen::<u32>();
            let (s0, s1) = engine.share(v, &mut rng);
            assert!(s0 < 256 && s1 < 256);
            assert_eq!(engine.add_mod(s0, s1), v & 0xFF);
        }
    }

    // S1: fixed value, fixed first share.
    #[test]
    fn test_reconstruct_deadbeef() {
        let engine = ArithmeticSharing::new(32).unwrap();
        let s0 = 0x11111111u32;
        let s1 = engine.sub_mod(0xDEADBEEF, s0);
        assert_eq!(s1, 0xCD9CADDE);

        let (mut p0, mut p1) = party_pair();
        let handle = std::thread::spawn(move || engine.reconstruct(&mut p1, s1).unwrap());
        let v0 = engine.reconstruct(&mut p0, s0).unwrap();
        let v1 = handle.join().unwrap();

        assert_eq!(v0, 0xDEADBEEF);
        assert_eq!(v1, 0xDEADBEEF);
    }

    #[test]
    fn test_reconstruct_vec_matches_scalar() {
        let engine = ArithmeticSharing::new(16).unwrap();
        let mut rng = ChaCha20Rng::seed_from_u64(5);

        let vs = (0..64).map(|_| rng.gen::<u32>() & 0xFFFF).collect_vec();
        let (sh0, sh1) = engine.share_vec(&vs, &mut rng);

        let (mut p0, mut p1) = party_pair();
        let handle = std::thread::spawn(move || engine.reconstruct_vec(&mut p1, &sh1).unwrap());
        let out0 = engine.reconstruct_vec(&mut p0, &sh0).unwrap();
        let out1 = handle.join().unwrap();

        assert_eq!(out0, vs);
        assert_eq!(out1, vs);
    }

    // Marginal uniformity of each share component: chi-squared over the
    // full k=8 range with a seeded rng. df = 255, so the statistic
    // concentrates around 255 +- ~23; 400 is far outside.
    #[test]
    fn test_share_marginal_uniformity() {
        let engine = ArithmeticSharing::new(8).unwrap();
        let mut rng = ChaCha20Rng::seed_from_u64(6);

        let samples = 256 * 200;
        let mut counts0 = [0u32; 256];
        let mut counts1 = [0u32; 256];
        for _ in 0..samples {
            let (s0, s1) = engine.share(123, &mut rng);
            counts0[s0 as usize] += 1;
            counts1[s1 as usize] += 1;
        }

        let expect = (samples / 256) as f64;
        for counts in [counts0, counts1] {
            let chi2: f64 = counts
                .iter()
                .map(|&c| {
                    let d = c as f64 - expect;
                    d * d / expect
                })
                .sum();
            assert!(chi2 < 400.0, "chi-squared statistic too large: {chi2}");
        }
    }

    #[test]
    fn test_triple_shares_recombine() {
        let engine = ArithmeticSharing::new(32).unwrap();
        let mut rng = ChaCha20Rng::seed_from_u64(8);

        let triples = engine.generate_triples(50, &mut rng);
        let (sh0, sh1) = engine.share_triples(&triples, &mut rng);

        for (t, t0, t1) in izip!(&triples, &sh0, &sh1) {
            assert_eq!(engine.mul_mod(t.a, t.b), t.c);
            assert_eq!(engine.add_mod(t0.a, t1.a), t.a);
            assert_eq!(engine.add_mod(t0.b, t1.b), t.b);
            // the c shares must recombine to a * b, not to fresh randomness
            assert_eq!(engine.add_mod(t0.c, t1.c), t.c);
        }
    }

    fn run_multiply(
        engine: ArithmeticSharing,
        shares: ((u32, u32), (u32, u32)),
        t0: BeaverTriple,
        t1: BeaverTriple,
    ) -> u32 {
        let ((x0, x1), (y0, y1)) = shares;
        let (mut p0, mut p1) = party_pair();

        let handle = std::thread::spawn(move || {
            let z1 = engine.multiply(&mut p1, t1, x1, y1).unwrap();
            engine.reconstruct(&mut p1, z1).unwrap()
        });

        let z0 = engine.multiply(&mut p0, t0, x0, y0).unwrap();
        let v0 = engine.reconstruct(&mut p0, z0).unwrap();
        let v1 = handle.join().unwrap();
        assert_eq!(v0, v1);
        v0
    }

    // S2: 7 * 6 with the fixed shares from the protocol walkthrough.
    #[test]
    fn test_multiply_fixed_shares() {
        let engine = ArithmeticSharing::new(32).unwrap();
        let product = run_multiply(
            engine,
            ((2, 5), (1, 5)),
            BeaverTriple::new(1, 2, 10),
            BeaverTriple::new(2, 3, 5),
        );
        assert_eq!(product, 42);
    }

    // S3: wrap-around in a narrow ring.
    #[test]
    fn test_multiply_mod_256() {
        let engine = ArithmeticSharing::new(8).unwrap();
        let mut rng = ChaCha20Rng::seed_from_u64(9);

        let (x0, x1) = engine.share(200, &mut rng);
        let (y0, y1) = engine.share(200, &mut rng);
        let triple = engine.generate_triples(1, &mut rng).pop().unwrap();
        let (t0, t1) = engine.share_triple(&triple, &mut rng);

        let product = run_multiply(engine, ((x0, x1), (y0, y1)), t0, t1);
        assert_eq!(product, 64);
    }

    #[test]
    fn test_multiply_random_inputs() {
        let engine = ArithmeticSharing::new(32).unwrap();
        let mut rng = ChaCha20Rng::seed_from_u64(10);

        for _ in 0..20 {
            let u = rng.gen::<u32>();
            let v = rng.gen::<u32>();
            let (x0, x1) = engine.share(u, &mut rng);
            let (y0, y1) = engine.share(v, &mut rng);
            let triple = engine.generate_triples(1, &mut rng).pop().unwrap();
            let (t0, t1) = engine.share_triple(&triple, &mut rng);

            let product = run_multiply(engine, ((x0, x1), (y0, y1)), t0, t1);
            assert_eq!(product, u.wrapping_mul(v));
        }
    }

    #[test]
    fn test_multiply_pair_single_round() {
        let engine = ArithmeticSharing::new(32).unwrap();
        let mut rng = ChaCha20Rng::seed_from_u64(11);

        let (x0, x1) = engine.share(1234, &mut rng);
        let (y0, y1) = engine.share(5678, &mut rng);
        let (u0, u1) = engine.share(1000, &mut rng);
        let (w0, w1) = engine.share(1 << 20, &mut rng);
        let clear = engine.generate_triples(2, &mut rng);
        let (mut sh0, mut sh1) = engine.share_triples(&clear, &mut rng);
        let (tb0, ta0) = (sh0.pop().unwrap(), sh0.pop().unwrap());
        let (tb1, ta1) = (sh1.pop().unwrap(), sh1.pop().unwrap());

        let (mut p0, mut p1) = party_pair();
        let handle = std::thread::spawn(move || {
            let (z1, w1) = engine
                .multiply_pair(&mut p1, (ta1, tb1), x1, y1, u1, w1)
                .unwrap();
            engine.reconstruct_vec(&mut p1, &[z1, w1]).unwrap()
        });

        let (z0, zz0) = engine
            .multiply_pair(&mut p0, (ta0, tb0), x0, y0, u0, w0)
            .unwrap();
        let out0 = engine.reconstruct_vec(&mut p0, &[z0, zz0]).unwrap();
        let out1 = handle.join().unwrap();

        assert_eq!(out0, vec![1234 * 5678, 1000 << 20]);
        assert_eq!(out0, out1);
    }

    // S4 plus property 4: the vector protocol must agree with the scalar
    // protocol on the same inputs and triples.
    #[test]
    fn test_multiply_vec() {
        let engine = ArithmeticSharing::new(32).unwrap();
        let mut rng = ChaCha20Rng::seed_from_u64(12);

        let xs = [1u32, 2, 3, 4];
        let ys = [10u32, 20, 30, 40];
        let (xs0, xs1) = engine.share_vec(&xs, &mut rng);
        let (ys0, ys1) = engine.share_vec(&ys, &mut rng);
        let clear = engine.generate_triples(4, &mut rng);
        let (ts0, ts1) = engine.share_triples(&clear, &mut rng);

        let (mut p0, mut p1) = party_pair();
        let handle = std::thread::spawn(move || {
            let zs1 = engine.multiply_vec(&mut p1, ts1, &xs1, &ys1).unwrap();
            engine.reconstruct_vec(&mut p1, &zs1).unwrap()
        });

        let zs0 = engine.multiply_vec(&mut p0, ts0, &xs0, &ys0).unwrap();
        let out0 = engine.reconstruct_vec(&mut p0, &zs0).unwrap();
        let out1 = handle.join().unwrap();

        assert_eq!(out0, vec![10, 40, 90, 160]);
        assert_eq!(out0, out1);
    }

    #[test]
    fn test_multiply_vec_length_mismatch() {
        let engine = ArithmeticSharing::new(32).unwrap();
        let mut rng = ChaCha20Rng::seed_from_u64(13);

        let clear = engine.generate_triples(2, &mut rng);
        let (ts0, _) = engine.share_triples(&clear, &mut rng);

        let (mut p0, _p1) = party_pair();

        let e = engine
            .multiply_vec(&mut p0, ts0.clone(), &[1, 2, 3], &[4, 5])
            .unwrap_err();
        assert!(matches!(
            e,
            Error::LengthMismatch {
                expected: 3,
                actual: 2
            }
        ));

        let e = engine
            .multiply_vec(&mut p0, ts0, &[1, 2, 3], &[4, 5, 6])
            .unwrap_err();
        assert!(matches!(
            e,
            Error::LengthMismatch {
                expected: 3,
                actual: 2
            }
        ));
    }
}
