// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
/*!
Runtime settings.

[Settings::default] holds the built-in values.  [Settings::from_env] overlays environment
variables on top of them:

| variable                   | meaning                                             | default |
|----------------------------|-----------------------------------------------------|---------|
| `FRAMESHIFT_ATLAS_CEILING` | largest atlas side, before the hardware limit       | 8192    |
| `FRAMESHIFT_DEFAULT_DELAY` | export delay for frames without one, in centiseconds | 3       |
| `FRAMESHIFT_READBACK_FLIP` | `1` flips captured rows vertically                  | off     |
| `FRAMESHIFT_DUMP_FRAMES`   | `1` writes every capture to `composite_<n>.png`     | off     |

Unparseable values are logged and ignored.
*/
use crate::animation::DEFAULT_DELAY_CENTISECONDS;
use crate::atlas::APPLICATION_CEILING;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Settings {
    pub atlas_ceiling: u32,
    pub default_delay_centiseconds: u16,
    /// Whether capture blits flip rows.  wgpu targets are already top-to-bottom.
    pub readback_flip: bool,
    pub dump_frames: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            atlas_ceiling: APPLICATION_CEILING,
            default_delay_centiseconds: DEFAULT_DELAY_CENTISECONDS,
            readback_flip: false,
            dump_frames: false,
        }
    }
}

impl Settings {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut settings = Settings::default();
        if let Some(ceiling) = parse(&lookup, "FRAMESHIFT_ATLAS_CEILING") {
            if ceiling == 0 {
                logwise::warn_sync!("FRAMESHIFT_ATLAS_CEILING must be positive, ignoring");
            } else {
                settings.atlas_ceiling = ceiling;
            }
        }
        if let Some(delay) = parse(&lookup, "FRAMESHIFT_DEFAULT_DELAY") {
            settings.default_delay_centiseconds = delay;
        }
        settings.readback_flip = flag(&lookup, "FRAMESHIFT_READBACK_FLIP");
        settings.dump_frames = flag(&lookup, "FRAMESHIFT_DUMP_FRAMES");
        settings
    }
}

fn parse<T: std::str::FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T> {
    let raw = lookup(key)?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            logwise::warn_sync!(
                "ignoring unparseable {key}={raw}",
                key = logwise::privacy::LogIt(&key),
                raw = logwise::privacy::LogIt(&raw)
            );
            None
        }
    }
}

fn flag(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> bool {
    lookup(key).map(|e| e == "1").unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn settings_with(vars: &[(&str, &str)]) -> Settings {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Settings::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn defaults() {
        let settings = settings_with(&[]);
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.atlas_ceiling, 8192);
        assert_eq!(settings.default_delay_centiseconds, 3);
        assert!(!settings.readback_flip);
    }

    #[test]
    fn overrides() {
        let settings = settings_with(&[
            ("FRAMESHIFT_ATLAS_CEILING", "2048"),
            ("FRAMESHIFT_DEFAULT_DELAY", " 10 "),
            ("FRAMESHIFT_READBACK_FLIP", "1"),
            ("FRAMESHIFT_DUMP_FRAMES", "yes"),
        ]);
        assert_eq!(settings.atlas_ceiling, 2048);
        assert_eq!(settings.default_delay_centiseconds, 10);
        assert!(settings.readback_flip);
        assert!(!settings.dump_frames);
    }

    #[test]
    fn bad_values_fall_back() {
        let settings = settings_with(&[
            ("FRAMESHIFT_ATLAS_CEILING", "0"),
            ("FRAMESHIFT_DEFAULT_DELAY", "soon"),
        ]);
        assert_eq!(settings, Settings::default());
    }
}
