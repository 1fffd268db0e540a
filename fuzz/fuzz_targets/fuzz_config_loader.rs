#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &str| {
    // Parse and validation errors are fine; panics are not.
    let Ok(cfg) = melon_config::load_toml(data) else {
        return;
    };
    if cfg.validate().is_err() {
        return;
    }
    // A validated config must always yield a usable catalog and horizon.
    let catalog = melon_core::MetricCatalog::from(&cfg);
    let growth = melon_core::GrowthCfg::from(&cfg.growth);
    let builder = melon_core::GrowthSeriesBuilder::from_cfg(&growth, catalog);
    let set = builder
        .build("2025-04-01", &melon_core::ModelSet::new(), &[])
        .expect("validated horizon is accepted by the builder");
    assert_eq!(set.labels.len() as i64, growth.horizon_days + 1);
});
