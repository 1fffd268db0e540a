#![no_main]
use libfuzzer_sys::fuzz_target;
use melon_core::{ModelParameters, ModelSet, Observation};

fuzz_target!(|data: &str| {
    let Ok(records) = melon_config::load_summaries_json(data) else {
        return;
    };
    // The loader rejects non-finite values, so conversion must succeed.
    let observations: Vec<Observation> = records
        .iter()
        .map(|r| Observation::try_from(r).expect("loader output converts"))
        .collect();

    let mut models = ModelSet::new();
    models.insert(
        "estimated_volume_px3".to_string(),
        Some(ModelParameters::new(100.0, 0.3, 20.0)),
    );
    let set = melon_core::build("2025-04-01", 65, &models, &observations)
        .expect("finite observations always build");
    for s in &set.series {
        assert_eq!(s.points.len(), 66);
        assert!(s.points.iter().all(|p| p.ideal.is_none_or(f64::is_finite)));
    }
});
