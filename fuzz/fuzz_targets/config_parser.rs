#![no_main]

use consentlab::aggregate::AggregateKind;
use consentlab::config::StudyConfig;
use consentlab::dataset::Column;
use consentlab::repeated::DeviceSelector;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(input) = std::str::from_utf8(data) {
        // None of these parsers may panic, whatever the input
        let config = StudyConfig::from_toml_str(input).unwrap_or_default();
        let _ = input.parse::<AggregateKind>();
        let _ = Column::parse(input, &config.design);
        let _ = DeviceSelector::parse(input, &config.design);
    }
});
