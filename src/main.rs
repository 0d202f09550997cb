//! Secure aggregation demo: one dealer, `PARTICIPANTS` sensors, one aggregator.

use std::error::Error;
use std::time::Instant;

use csv::Writer;
use itertools::Itertools;
use paillier_agg::{
    agg_keys, decrypt_and_decode, encode_and_encrypt, keygen, AggregationKey, Cipher,
    EncodingParams, PaillierAlgebra, PublicKey, WireFormat,
};
use rand::rngs::OsRng;
use rand::Rng;
use tracing::{info, warn};
use tracing_subscriber::fmt;

fn main() -> Result<(), Box<dyn Error>> {
    fmt()
        .with_max_level(tracing::Level::INFO)
        .with_target(false)
        .init();

    // -------------- per-round timing log --------------
    let mut wtr = Writer::from_path("agg_stats.csv")?;
    wtr.write_record(["round", "time_ms", "participants", "abs_error"])?;

    let key_bits = 1024;
    let participants = 16;
    let rounds: u64 = 20;
    let params = EncodingParams::default();

    info!(key_bits, participants, rounds, "initializing");
    let (pubkey, prvkey) = keygen(key_bits)?;
    let shares = agg_keys::generate(&pubkey, participants)?;

    // Dealer ships the public key and one share to every sensor as text.
    let pubkey_wire = pubkey.to_wire();
    let sensors: Vec<(PublicKey, AggregationKey)> = shares
        .iter()
        .map(|share| -> paillier_agg::Result<_> {
            Ok((
                PublicKey::from_wire(&pubkey_wire)?,
                AggregationKey::from_wire(&share.to_wire())?,
            ))
        })
        .collect::<paillier_agg::Result<_>>()?;
    drop(shares);

    let mut rng = OsRng;
    let alg = PaillierAlgebra::new(&pubkey, params)?;
    let tolerance = participants as f64 * 2f64.powi(-(params.frac_bits as i32));

    for round in 0..rounds {
        let readings: Vec<f64> = (0..participants)
            .map(|_| rng.gen_range(-50.0..50.0))
            .collect_vec();
        let expected: f64 = readings.iter().sum();

        let start = Instant::now();
        let uploads: Vec<String> = sensors
            .iter()
            .zip(&readings)
            .map(|((pk, share), &x)| -> paillier_agg::Result<String> {
                let sensor = PaillierAlgebra::new(pk, params)?;
                let ct = encode_and_encrypt(pk, x, 0, &params, &mut rng)?;
                Ok(sensor.apply_round_mask(&ct, share, round)?.to_wire())
            })
            .collect::<paillier_agg::Result<_>>()?;

        let received: Vec<Cipher> = uploads
            .iter()
            .map(|s| Cipher::from_wire(s))
            .collect::<paillier_agg::Result<_>>()?;
        let total = alg.sum_ciphertexts(&received)?;
        let sum = decrypt_and_decode(&prvkey, &total, 0, &params)?;
        let elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;

        let abs_error = (sum - expected).abs();
        if abs_error > tolerance {
            warn!(round, sum, expected, "aggregate does not match");
        } else {
            info!(round, sum, elapsed_ms, "aggregated");
        }
        wtr.write_record(&[
            round.to_string(),
            format!("{elapsed_ms:.6}"),
            participants.to_string(),
            format!("{abs_error:e}"),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}
