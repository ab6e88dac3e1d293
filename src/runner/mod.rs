//! Protocol check registry and the drivers behind the runner binary.
//!
//! Both parties derive dealer material (inputs, shares, triples) from fixed
//! seeds, so two separate processes agree on every share without a wire
//! dealer protocol; only the protocol messages themselves cross the
//! network. Each check name maps to a handler registered in [`registry`].

use crate::channel_utils::ShareChannel;
use crate::cli_utils::{Args, Mode};
use crate::party::{Party, TcpParty};
use crate::sharing::{ArithmeticSharing, BooleanSharing};
use anyhow::{bail, Context, Result};
use itertools::Itertools;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;
use std::io::Write;
use std::time::Instant;

/// A named protocol check. Runs the same code on both parties; the party id
/// inside `party` decides each side's role.
pub type Handler<C> = fn(&mut Party<C>) -> Result<()>;

/// All registered checks, in execution order.
pub fn registry<C: ShareChannel>() -> Vec<(&'static str, Handler<C>)> {
    vec![
        ("reconstruct", check_reconstruct),
        ("reconstruct_vec", check_reconstruct_vec),
        ("multiply", check_multiply),
        ("multiply_pair", check_multiply_pair),
        ("multiply_vec", check_multiply_vec),
        ("bool_and", check_bool_and),
        ("bool_or", check_bool_or),
    ]
}

fn dealer_rng(check: &str) -> ChaCha20Rng {
    // Any stable per-check seed works; both parties must derive the same one.
    let tag: u64 = check.bytes().fold(0, |acc, b| acc.wrapping_mul(31).wrapping_add(b as u64));
    ChaCha20Rng::seed_from_u64(0x2905_BEA7 ^ tag)
}

fn expect_eq(name: &str, got: u32, want: u32) -> Result<()> {
    if got != want {
        bail!("check {}: reconstructed {} but expected {}", name, got, want);
    }
    Ok(())
}

fn check_reconstruct<C: ShareChannel>(party: &mut Party<C>) -> Result<()> {
    let engine = ArithmeticSharing::new(32)?;
    let mut rng = dealer_rng("reconstruct");

    let v = rng.gen::<u32>();
    let shares = engine.share(v, &mut rng);
    let own = if party.id() == 0 { shares.0 } else { shares.1 };

    let out = engine.reconstruct(party, own)?;
    expect_eq("reconstruct", out, v)
}

fn check_reconstruct_vec<C: ShareChannel>(party: &mut Party<C>) -> Result<()> {
    let engine = ArithmeticSharing::new(32)?;
    let mut rng = dealer_rng("reconstruct_vec");

    let vs = (0..256).map(|_| rng.gen::<u32>()).collect_vec();
    let (sh0, sh1) = engine.share_vec(&vs, &mut rng);
    let own = if party.id() == 0 { sh0 } else { sh1 };

    let out = engine.reconstruct_vec(party, &own)?;
    for (got, want) in out.into_iter().zip(vs) {
        expect_eq("reconstruct_vec", got, want)?;
    }
    Ok(())
}

fn check_multiply<C: ShareChannel>(party: &mut Party<C>) -> Result<()> {
    let engine = ArithmeticSharing::new(32)?;
    let mut rng = dealer_rng("multiply");

    let u = rng.gen::<u32>();
    let v = rng.gen::<u32>();
    let xs = engine.share(u, &mut rng);
    let ys = engine.share(v, &mut rng);
    let triple = engine.generate_triples(1, &mut rng).pop().unwrap();
    let (t0, t1) = engine.share_triple(&triple, &mut rng);

    let (x, y, t) = if party.id() == 0 {
        (xs.0, ys.0, t0)
    } else {
        (xs.1, ys.1, t1)
    };

    let z = engine.multiply(party, t, x, y)?;
    let out = engine.reconstruct(party, z)?;
    expect_eq("multiply", out, u.wrapping_mul(v))
}

fn check_multiply_pair<C: ShareChannel>(party: &mut Party<C>) -> Result<()> {
    let engine = ArithmeticSharing::new(16)?;
    let mut rng = dealer_rng("multiply_pair");

    let inputs: [u32; 4] = {
        let mut draw = || rng.gen::<u32>() & 0xFFFF;
        [draw(), draw(), draw(), draw()]
    };
    let [u1, v1, u2, v2] = inputs;
    let shares = inputs.map(|w| engine.share(w, &mut rng));
    let clear = engine.generate_triples(2, &mut rng);
    let (ts0, ts1) = engine.share_triples(&clear, &mut rng);

    let id = party.id();
    let pick = move |pair: (u32, u32)| if id == 0 { pair.0 } else { pair.1 };
    let ts = if id == 0 { ts0 } else { ts1 };
    let (ta, tb) = ts.into_iter().collect_tuple().unwrap();

    let (z1, z2) = engine.multiply_pair(
        party,
        (ta, tb),
        pick(shares[0]),
        pick(shares[1]),
        pick(shares[2]),
        pick(shares[3]),
    )?;
    let out = engine.reconstruct_vec(party, &[z1, z2])?;

    expect_eq("multiply_pair", out[0], engine.mul_mod(u1, v1))?;
    expect_eq("multiply_pair", out[1], engine.mul_mod(u2, v2))
}

fn check_multiply_vec<C: ShareChannel>(party: &mut Party<C>) -> Result<()> {
    let engine = ArithmeticSharing::new(32)?;
    let mut rng = dealer_rng("multiply_vec");

    let n = 128;
    let us = (0..n).map(|_| rng.gen::<u32>()).collect_vec();
    let vs = (0..n).map(|_| rng.gen::<u32>()).collect_vec();
    let (xs0, xs1) = engine.share_vec(&us, &mut rng);
    let (ys0, ys1) = engine.share_vec(&vs, &mut rng);
    let clear = engine.generate_triples(n, &mut rng);
    let (ts0, ts1) = engine.share_triples(&clear, &mut rng);

    let (xs, ys, ts) = if party.id() == 0 {
        (xs0, ys0, ts0)
    } else {
        (xs1, ys1, ts1)
    };

    let zs = engine.multiply_vec(party, ts, &xs, &ys)?;
    let out = engine.reconstruct_vec(party, &zs)?;
    for (got, (u, v)) in out.into_iter().zip(us.into_iter().zip(vs)) {
        expect_eq("multiply_vec", got, u.wrapping_mul(v))?;
    }
    Ok(())
}

fn check_bool_and<C: ShareChannel>(party: &mut Party<C>) -> Result<()> {
    let engine = BooleanSharing::new();
    let mut rng = dealer_rng("bool_and");

    let xs = [0u32, 0, 1, 1];
    let ys = [0u32, 1, 0, 1];
    let xsh = engine.share_vec(&xs, &mut rng);
    let ysh = engine.share_vec(&ys, &mut rng);
    let clear = engine.generate_triples(4, &mut rng);
    let (ts0, ts1) = engine.share_triples(&clear, &mut rng);

    let (xv, yv, ts) = if party.id() == 0 {
        (xsh.0, ysh.0, ts0)
    } else {
        (xsh.1, ysh.1, ts1)
    };

    let zs = engine.and_vec(party, ts, &xv, &yv)?;
    let out = engine.reconstruct_vec(party, &zs)?;
    for (got, (x, y)) in out.into_iter().zip(xs.into_iter().zip(ys)) {
        expect_eq("bool_and", got, x & y)?;
    }
    Ok(())
}

fn check_bool_or<C: ShareChannel>(party: &mut Party<C>) -> Result<()> {
    let engine = BooleanSharing::new();
    let mut rng = dealer_rng("bool_or");

    let xs = [0u32, 0, 1, 1];
    let ys = [0u32, 1, 0, 1];
    let xsh = engine.share_vec(&xs, &mut rng);
    let ysh = engine.share_vec(&ys, &mut rng);
    let clear = engine.generate_triples(4, &mut rng);
    let (ts0, ts1) = engine.share_triples(&clear, &mut rng);

    let (xv, yv, ts) = if party.id() == 0 {
        (xsh.0, ysh.0, ts0)
    } else {
        (xsh.1, ysh.1, ts1)
    };

    let zs = engine.or_vec(party, ts, &xv, &yv)?;
    let out = engine.reconstruct_vec(party, &zs)?;
    for (got, (x, y)) in out.into_iter().zip(xs.into_iter().zip(ys)) {
        expect_eq("bool_or", got, x | y)?;
    }
    Ok(())
}

/// Run every registered check (or the one selected by name) on `party`.
pub fn run_checks<C: ShareChannel>(party: &mut Party<C>, only: Option<&str>) -> Result<()> {
    let checks = registry::<C>();

    if let Some(name) = only {
        if !checks.iter().any(|(n, _)| *n == name) {
            let known = checks.iter().map(|(n, _)| *n).join(", ");
            bail!("unknown check {:?} (known: {})", name, known);
        }
    }

    for (name, handler) in checks {
        if only.is_some_and(|n| n != name) {
            continue;
        }
        handler(party).with_context(|| format!("check {} failed", name))?;
        println!("{} ok.", name);
    }

    Ok(())
}

/// Time the vector multiplication protocol and report throughput.
pub fn run_bench<C: ShareChannel>(
    party: &mut Party<C>,
    iterations: usize,
    output: Option<&std::path::Path>,
) -> Result<()> {
    let engine = ArithmeticSharing::new(32)?;
    let size = 1024;

    party.reset_bytes_sent();
    let start = Instant::now();

    for round in 0..iterations {
        // fresh dealer material per round so every multiplication consumes
        // a fresh triple
        let mut rng = ChaCha20Rng::seed_from_u64(round as u64);
        let us = (0..size).map(|_| rng.gen::<u32>()).collect_vec();
        let vs = (0..size).map(|_| rng.gen::<u32>()).collect_vec();
        let (xs0, xs1) = engine.share_vec(&us, &mut rng);
        let (ys0, ys1) = engine.share_vec(&vs, &mut rng);
        let clear = engine.generate_triples(size, &mut rng);
        let (ts0, ts1) = engine.share_triples(&clear, &mut rng);

        let (xs, ys, ts) = if party.id() == 0 {
            (xs0, ys0, ts0)
        } else {
            (xs1, ys1, ts1)
        };

        engine.multiply_vec(party, ts, &xs, &ys)?;
    }

    let elapsed = start.elapsed();
    let total = (size * iterations) as f64;
    let rate = total / elapsed.as_secs_f64();
    let bytes = party.bytes_sent();

    println!(
        "multiply_vec: {} elements over {} rounds in {:.3} s ({:.0} elements/s, {} bytes sent)",
        size * iterations,
        iterations,
        elapsed.as_secs_f64(),
        rate,
        bytes
    );

    if let Some(path) = output {
        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("Failed to open report file {}", path.display()))?;
        writeln!(
            file,
            "{},{},{},{:.6},{}",
            party.id(),
            size,
            iterations,
            elapsed.as_secs_f64(),
            bytes
        )?;
    }

    Ok(())
}

/// Run the mode selected on the command line over a TCP session.
pub fn run(args: Args) -> Result<()> {
    let Args {
        party: id,
        mode,
        port,
        server,
        name,
        output,
        iteration,
    } = args;

    let mut tcp = TcpParty::new(id, &server, port)?;
    tcp.start()
        .with_context(|| format!("Failed to start party {}.", id))?;

    println!("party {} connected.", id);

    let party = tcp.party()?;
    let res = match mode {
        Mode::Test => run_checks(party, name.as_deref()),
        Mode::Bench => run_bench(party, iteration, output.as_deref()),
    };

    tcp.end();

    res
}
