use std::str::FromStr;

use crate::geo::Region;
use crate::ConfigError;

/// Provinces with a preset map framing, selectable from the province picker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Province {
    #[default]
    Gauteng,
    KwaZuluNatal,
    CapeTown,
}

impl Province {
    pub const ALL: [Province; 3] = [Province::Gauteng, Province::KwaZuluNatal, Province::CapeTown];

    /// Preset viewport for this province.
    #[must_use]
    pub const fn region(self) -> Region {
        match self {
            Province::Gauteng => Region::new(-25.746_111, 28.188_056, 1.0, 1.0),
            Province::KwaZuluNatal => Region::new(-29.858_680, 31.021_840, 1.5, 1.5),
            Province::CapeTown => Region::new(-33.924_870, 18.424_055, 0.5, 0.5),
        }
    }

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Province::Gauteng => "Gauteng",
            Province::KwaZuluNatal => "KwaZulu-Natal",
            Province::CapeTown => "Cape Town",
        }
    }
}

impl std::fmt::Display for Province {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Province {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // "KwaZulu-Natal", "kwazulu natal" and "KwaZuluNatal" all match.
        let squash = |v: &str| v.replace(['-', ' '], "").to_ascii_lowercase();
        let wanted = squash(s.trim());
        Province::ALL
            .into_iter()
            .find(|p| squash(p.name()) == wanted)
            .ok_or_else(|| {
                ConfigError::Validation(format!(
                    "unknown province '{s}'; expected one of Gauteng, KwaZulu-Natal, Cape Town"
                ))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_province_is_gauteng() {
        assert_eq!(Province::default(), Province::Gauteng);
    }

    #[test]
    fn parses_display_names_case_insensitively() {
        assert_eq!("gauteng".parse::<Province>().unwrap(), Province::Gauteng);
        assert_eq!(
            "KwaZulu-Natal".parse::<Province>().unwrap(),
            Province::KwaZuluNatal
        );
        assert_eq!("kwazulunatal".parse::<Province>().unwrap(), Province::KwaZuluNatal);
        assert_eq!("cape town".parse::<Province>().unwrap(), Province::CapeTown);
    }

    #[test]
    fn rejects_unknown_province() {
        let err = "Limpopo".parse::<Province>().unwrap_err();
        assert!(err.to_string().contains("unknown province"));
    }

    #[test]
    fn preset_regions_have_positive_spans() {
        for province in Province::ALL {
            let region = province.region();
            assert!(region.latitude_delta > 0.0, "{province}");
            assert!(region.longitude_delta > 0.0, "{province}");
        }
    }
}
