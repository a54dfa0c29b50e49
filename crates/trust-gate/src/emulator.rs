use crate::environment::BuildInfo;

type FingerprintRule = fn(&BuildInfo) -> bool;

/// Known emulator signatures. Each rule is a pure predicate over the build
/// descriptor; adding a heuristic is a new row here.
const EMULATOR_RULES: [(&str, FingerprintRule); 11] = [
    ("fingerprint_generic", |b| starts_with(&b.fingerprint, "generic")),
    ("fingerprint_unknown", |b| starts_with(&b.fingerprint, "unknown")),
    ("model_google_sdk", |b| contains(&b.model, "google_sdk")),
    ("model_emulator", |b| contains(&b.model, "Emulator")),
    ("model_sdk_x86", |b| contains(&b.model, "Android SDK built for x86")),
    ("manufacturer_genymotion", |b| contains(&b.manufacturer, "Genymotion")),
    ("brand_device_generic", |b| {
        starts_with(&b.brand, "generic") && starts_with(&b.device, "generic")
    }),
    ("product_google_sdk", |b| b.product.as_deref() == Some("google_sdk")),
    ("hardware_goldfish", |b| contains(&b.hardware, "goldfish")),
    ("hardware_ranchu", |b| contains(&b.hardware, "ranchu")),
    ("hardware_vbox", |b| contains(&b.hardware, "vbox86")),
];

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EmulatorObservation {
    pub matched_rules: Vec<&'static str>,
}

impl EmulatorObservation {
    pub fn detected(&self) -> bool {
        !self.matched_rules.is_empty()
    }
}

pub fn detect_emulator(build: &BuildInfo) -> EmulatorObservation {
    let matched_rules = EMULATOR_RULES
        .iter()
        .filter(|(_, rule)| rule(build))
        .map(|(name, _)| *name)
        .collect();
    EmulatorObservation { matched_rules }
}

pub fn emulator_rule_names() -> Vec<&'static str> {
    EMULATOR_RULES.iter().map(|(name, _)| *name).collect()
}

fn starts_with(field: &Option<String>, prefix: &str) -> bool {
    field.as_deref().is_some_and(|value| value.starts_with(prefix))
}

fn contains(field: &Option<String>, needle: &str) -> bool {
    field.as_deref().is_some_and(|value| value.contains(needle))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_fields_never_match() {
        let observation = detect_emulator(&BuildInfo::default());
        assert!(!observation.detected());
    }

    #[test]
    fn generic_brand_alone_is_not_enough() {
        let build = BuildInfo {
            brand: Some("generic_x86".to_string()),
            device: Some("walleye".to_string()),
            ..BuildInfo::default()
        };
        assert!(!detect_emulator(&build).detected());
    }
}
