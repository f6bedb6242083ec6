#![cfg(feature = "parallel")]

mod common;

use common::light_curve;
use magstats::{compute_magstats, compute_magstats_batches, LightCurveBatch, MagstatsParams};

#[test]
fn test_batches_match_sequential_computation() {
    let batches: Vec<LightCurveBatch> = (0..8)
        .map(|i| {
            let aid = format!("AID{i}");
            LightCurveBatch::new(light_curve(&aid, 1, 59000.0 + i as f64, 5 + i), vec![]).unwrap()
        })
        .collect();
    let params = MagstatsParams::default();

    let parallel = compute_magstats_batches(&batches, &params).unwrap();
    assert_eq!(parallel.len(), batches.len());
    for (batch, output) in batches.iter().zip(&parallel) {
        let sequential = compute_magstats(batch, &params).unwrap();
        assert_eq!(output.to_json().unwrap(), sequential.to_json().unwrap());
    }
    assert_eq!(parallel[3].magstats[0].ndet, Some(8));
}
