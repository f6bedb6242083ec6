mod common;

use approx::assert_relative_eq;
use common::{assert_magnitudes_close, data_path, light_curve};
use magstats::{
    compute_magstats, Calculator, LightCurveBatch, MagstatsOutput, MagstatsParams, NonDetection,
};

fn reference_output(params: &MagstatsParams) -> MagstatsOutput {
    let batch = LightCurveBatch::from_csv_files(
        &data_path("detections.csv"),
        Some(&data_path("non_detections.csv")),
    )
    .unwrap();
    compute_magstats(&batch, params).unwrap()
}

#[test]
fn test_object_records() {
    let output = reference_output(&MagstatsParams::default());
    assert_eq!(output.objects.len(), 2);

    let aid1 = &output.objects[0];
    assert_eq!(aid1.aid, "AID1");
    assert_eq!(aid1.oid, vec!["ATLAS20b", "ZTF20aaa"]);
    assert_eq!(aid1.tid, vec!["ATLAS", "ZTF"]);
    assert_eq!(aid1.ndet, Some(4));
    assert_eq!(aid1.firstmjd, Some(59000.10));
    assert_eq!(aid1.lastmjd, Some(59003.05));
    assert_eq!(aid1.corrected, Some(true));
    assert_eq!(aid1.stellar, Some(true));
    assert_relative_eq!(aid1.meanra.unwrap(), 150.0001945945946, epsilon = 1e-9);
    assert_relative_eq!(aid1.meandec.unwrap(), 2.2001945945945947, epsilon = 1e-9);
    assert_relative_eq!(aid1.sigmara.unwrap(), 0.19727878476642874, epsilon = 1e-9);
    assert_relative_eq!(aid1.sigmadec.unwrap(), 0.19727878476642874, epsilon = 1e-9);

    let aid2 = &output.objects[1];
    assert_eq!(aid2.ndet, Some(1));
    assert_relative_eq!(aid2.meanra.unwrap(), 210.5, epsilon = 1e-9);
    assert_relative_eq!(aid2.sigmadec.unwrap(), 0.5, epsilon = 1e-9);
}

#[test]
fn test_filter_records() {
    let output = reference_output(&MagstatsParams::default());
    let keys: Vec<_> = output
        .magstats
        .iter()
        .map(|m| (m.aid.as_str(), m.fid))
        .collect();
    assert_eq!(keys, vec![("AID1", 1), ("AID1", 2), ("AID2", 2)]);

    let g = &output.magstats[0];
    assert_magnitudes_close(g, 16.833333333333332, 16.8, 16.5, 17.2, 0.28674417556808723);
    assert_eq!(g.magfirst, Some(17.2));
    assert_eq!(g.maglast, Some(16.5));
    assert_relative_eq!(g.magmean_corr.unwrap(), 16.9, epsilon = 1e-10);
    assert_relative_eq!(g.magsigma_corr.unwrap(), 0.2, epsilon = 1e-10);
    assert_eq!(g.magfirst_corr, Some(17.1));
    assert_eq!(g.maglast_corr, Some(16.7));
    assert_eq!(g.ndet, Some(3));
    assert_eq!(g.ndubious, Some(0));
    assert_eq!(g.saturation_rate, Some(0.0));
    assert_eq!(g.corrected, Some(true));
    assert_eq!(g.stellar, Some(true));

    // the non-detection 2 days before wins: its rate is the lowest
    let dmdt = g.dmdt.unwrap();
    assert_relative_eq!(dmdt.dt_first, 2.0, epsilon = 1e-9);
    assert_relative_eq!(dmdt.dm_first, -2.0, epsilon = 1e-9);
    assert_relative_eq!(dmdt.sigmadm_first, -19.15, epsilon = 1e-9);
    assert_relative_eq!(dmdt.dmdt_first, -0.975, epsilon = 1e-9);

    let r = &output.magstats[1];
    assert_magnitudes_close(r, 17.6, 17.6, 17.6, 17.6, 0.0);
    assert_eq!(r.magmean_corr, None);
    assert_eq!(r.ndubious, Some(1));
    assert!(r.saturation_rate.unwrap().is_nan());
    // non-detection only 0.2 days before the first detection
    assert_eq!(r.dmdt, None);

    let aid2 = &output.magstats[2];
    assert_relative_eq!(aid2.dmdt.unwrap().dmdt_first, -0.85, epsilon = 1e-9);
}

#[test]
fn test_json_output_shape() {
    let output = reference_output(&MagstatsParams::default());
    let json: serde_json::Value = serde_json::from_str(&output.to_json().unwrap()).unwrap();

    let g = &json["magstats"][0];
    assert_relative_eq!(g["dt_first"].as_f64().unwrap(), 2.0, epsilon = 1e-9);
    assert!(g["magmean_corr"].is_number());

    let r = &json["magstats"][1];
    assert!(r["saturation_rate"].is_null());
    assert!(r["magmean_corr"].is_null());
    assert!(r.get("dmdt_first").is_none());
}

#[test]
fn test_batch_without_non_detections_has_no_dmdt_block() {
    let batch = LightCurveBatch::from_csv_files(&data_path("detections.csv"), None).unwrap();
    let output = compute_magstats(&batch, &MagstatsParams::default()).unwrap();
    let json = output.to_json().unwrap();

    for column in ["dt_first", "dm_first", "sigmadm_first", "dmdt_first"] {
        assert!(!json.contains(column));
    }
}

#[test]
fn test_shared_calculator_names_exclude_both_levels() {
    let params = MagstatsParams::builder()
        .exclude_names("mjd,ndet")
        .build()
        .unwrap();
    let output = reference_output(&params);

    assert!(output
        .objects
        .iter()
        .all(|o| o.firstmjd.is_none() && o.ndet.is_none() && o.meanra.is_some()));
    assert!(output
        .magstats
        .iter()
        .all(|m| m.firstmjd.is_none() && m.ndet.is_none() && m.magmean.is_some()));
}

#[test]
fn test_summaries() {
    let summaries = reference_output(&MagstatsParams::default()).summaries();
    assert_eq!(summaries.len(), 2);
    assert_eq!(summaries[0].magstats.len(), 2);
    assert_eq!(summaries[1].object.aid, "AID2");
    assert_eq!(summaries[1].magstats[0].fid, 2);

    let json = serde_json::to_value(&summaries[1]).unwrap();
    assert_eq!(json["aid"], "AID2");
    assert_eq!(json["magstats"][0]["fid"], 2);
}

#[test]
fn test_many_objects() {
    let mut detections = Vec::new();
    let mut non_detections = Vec::new();
    for i in 0..50 {
        let aid = format!("AID{i:03}");
        detections.extend(light_curve(&aid, 1, 59000.0, 10));
        detections.extend(light_curve(&aid, 2, 59000.5, 4));
        non_detections.push(NonDetection::new(aid.as_str(), 1, 58990.0, 20.0));
    }
    let batch = LightCurveBatch::new(detections, non_detections).unwrap();
    let output = compute_magstats(&batch, &MagstatsParams::default()).unwrap();

    assert_eq!(output.objects.len(), 50);
    assert_eq!(output.magstats.len(), 100);
    for pair in output.magstats.chunks(2) {
        assert_eq!(pair[0].ndet, Some(10));
        assert_eq!(pair[1].ndet, Some(4));
        assert_relative_eq!(pair[0].magmean.unwrap(), 17.55, epsilon = 1e-10);
        assert_eq!(pair[0].magfirst, Some(18.0));
        assert!(pair[0].dmdt.is_some());
        assert!(pair[1].dmdt.is_none());
    }
    for object in &output.objects {
        assert_eq!(object.ndet, Some(14));
        assert_relative_eq!(object.meanra.unwrap(), 45.0, epsilon = 1e-10);
        assert_relative_eq!(object.sigmara.unwrap(), 0.5 / 14f64.sqrt(), epsilon = 1e-10);
    }
}

#[test]
fn test_exclusions_do_not_change_other_columns() {
    let full = reference_output(&MagstatsParams::default());
    for calculator in Calculator::ALL {
        let params = MagstatsParams::builder().exclude(calculator).build().unwrap();
        let partial = reference_output(&params);

        assert_eq!(partial.objects.len(), full.objects.len());
        for (f, p) in full.magstats.iter().zip(&partial.magstats) {
            if calculator != Calculator::Statistics {
                assert_eq!(f.magmedian, p.magmedian);
            }
            if calculator != Calculator::Ndubious {
                assert_eq!(f.ndubious, p.ndubious);
            }
        }
    }
}
