// Named columns of the participant table
//
// Raw per-cell columns use dotted names (`phone.news.answer.int`), derived
// participant aggregates use underscore names (`phone_accepts`). Names are
// resolved against the study design; anything the design does not know is a
// MissingColumn error, never a silent skip.

use crate::config::StudyDesign;
use crate::error::{AnalysisError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Column {
    /// Decision on one device and website (1 accept, 0 reject)
    Answer { device: String, website: String },
    /// Response time on one device and website
    Time { device: String, website: String },
    /// Withdrawal time on one device and website
    WithdrawalTime { device: String, website: String },
    /// Accepts for one website summed over devices
    WebsiteAccepts { website: String },
    /// Response time for one website averaged over devices
    WebsiteAverageTime { website: String },
    /// Accepts on one device summed over websites
    DeviceAccepts { device: String },
    TotalAccepts,
    /// Response time on one device averaged over websites
    DeviceAverageTime { device: String },
    TotalAverageTime,
    CookieQuestionsScore,
    AgeInt,
    UnderstandCookieConsentInt,
    /// Mean withdrawal time over cells where consent was withdrawn
    AverageWithdrawalTime,
    /// Mean decision time over the same cells as `AverageWithdrawalTime`
    AverageConsentGivenWithdrawalTime,
}

const ANSWER_SUFFIX: &str = "answer.int";
const TIME_SUFFIX: &str = "time";
const WITHDRAWAL_SUFFIX: &str = "withdrawal_time";

impl Column {
    /// Resolve a column name against the design
    ///
    /// # Example
    /// ```
    /// use consentlab::config::StudyDesign;
    /// use consentlab::dataset::Column;
    ///
    /// let design = StudyDesign::new(&["computer", "phone"], &["news", "shop"]);
    /// let column = Column::parse("phone.news.answer.int", &design).unwrap();
    /// assert_eq!(column.name(), "phone.news.answer.int");
    /// assert!(Column::parse("tablet_accepts", &design).is_err());
    /// ```
    pub fn parse(name: &str, design: &StudyDesign) -> Result<Self> {
        let column = match name {
            "total_accepts" => Self::TotalAccepts,
            "total_average_time" => Self::TotalAverageTime,
            "cookie_questions_score" => Self::CookieQuestionsScore,
            "age_int" => Self::AgeInt,
            "understand_cookie_consent_int" => Self::UnderstandCookieConsentInt,
            "average_withdrawal_times" => Self::AverageWithdrawalTime,
            "average_consent_given_withdrawal_times" => Self::AverageConsentGivenWithdrawalTime,
            _ => Self::parse_dynamic(name, design)?,
        };
        column.check(design)?;
        Ok(column)
    }

    fn parse_dynamic(name: &str, design: &StudyDesign) -> Result<Self> {
        if let Some((device, rest)) = name.split_once('.') {
            let (website, suffix) = rest.split_once('.').ok_or_else(|| {
                AnalysisError::missing_column(name, "expected `device.website.field`")
            })?;
            let device = device.to_string();
            let website = website.to_string();
            return match suffix {
                ANSWER_SUFFIX => Ok(Self::Answer { device, website }),
                TIME_SUFFIX => Ok(Self::Time { device, website }),
                WITHDRAWAL_SUFFIX => Ok(Self::WithdrawalTime { device, website }),
                other => Err(AnalysisError::missing_column(
                    name,
                    format!("unknown per-cell field `{}`", other),
                )),
            };
        }

        if let Some(website) = name.strip_suffix("_accepts_int") {
            return Ok(Self::WebsiteAccepts {
                website: website.to_string(),
            });
        }
        if let Some(device) = name.strip_suffix("_accepts") {
            return Ok(Self::DeviceAccepts {
                device: device.to_string(),
            });
        }
        if let Some(prefix) = name.strip_suffix("_average_time") {
            // Device and website names are disjoint in a valid design
            return if design.website_index(prefix).is_some() {
                Ok(Self::WebsiteAverageTime {
                    website: prefix.to_string(),
                })
            } else {
                Ok(Self::DeviceAverageTime {
                    device: prefix.to_string(),
                })
            };
        }

        Err(AnalysisError::missing_column(
            name,
            "not a known participant column",
        ))
    }

    /// Verify every device and website the column refers to exists in the design
    pub fn check(&self, design: &StudyDesign) -> Result<()> {
        if let Some(device) = self.device() {
            if design.device_index(device).is_none() {
                return Err(AnalysisError::missing_column(
                    self.name(),
                    format!("device `{}` is not part of the study design", device),
                ));
            }
        }
        if let Some(website) = self.website() {
            if design.website_index(website).is_none() {
                return Err(AnalysisError::missing_column(
                    self.name(),
                    format!("website `{}` is not part of the study design", website),
                ));
            }
        }
        Ok(())
    }

    pub fn device(&self) -> Option<&str> {
        match self {
            Self::Answer { device, .. }
            | Self::Time { device, .. }
            | Self::WithdrawalTime { device, .. }
            | Self::DeviceAccepts { device }
            | Self::DeviceAverageTime { device } => Some(device),
            _ => None,
        }
    }

    pub fn website(&self) -> Option<&str> {
        match self {
            Self::Answer { website, .. }
            | Self::Time { website, .. }
            | Self::WithdrawalTime { website, .. }
            | Self::WebsiteAccepts { website }
            | Self::WebsiteAverageTime { website } => Some(website),
            _ => None,
        }
    }

    /// Canonical column name
    pub fn name(&self) -> String {
        match self {
            Self::Answer { device, website } => format!("{}.{}.{}", device, website, ANSWER_SUFFIX),
            Self::Time { device, website } => format!("{}.{}.{}", device, website, TIME_SUFFIX),
            Self::WithdrawalTime { device, website } => {
                format!("{}.{}.{}", device, website, WITHDRAWAL_SUFFIX)
            }
            Self::WebsiteAccepts { website } => format!("{}_accepts_int", website),
            Self::WebsiteAverageTime { website } => format!("{}_average_time", website),
            Self::DeviceAccepts { device } => format!("{}_accepts", device),
            Self::TotalAccepts => "total_accepts".to_string(),
            Self::DeviceAverageTime { device } => format!("{}_average_time", device),
            Self::TotalAverageTime => "total_average_time".to_string(),
            Self::CookieQuestionsScore => "cookie_questions_score".to_string(),
            Self::AgeInt => "age_int".to_string(),
            Self::UnderstandCookieConsentInt => "understand_cookie_consent_int".to_string(),
            Self::AverageWithdrawalTime => "average_withdrawal_times".to_string(),
            Self::AverageConsentGivenWithdrawalTime => {
                "average_consent_given_withdrawal_times".to_string()
            }
        }
    }

    /// Human-readable description used as a report heading
    pub fn description(&self) -> String {
        match self {
            Self::Answer { device, website } => format!("Decision on {} ({})", website, device),
            Self::Time { device, website } => format!("Answer time on {} ({})", website, device),
            Self::WithdrawalTime { device, website } => {
                format!("Withdrawal time on {} ({})", website, device)
            }
            Self::WebsiteAccepts { website } => format!("Accepts on {} across devices", website),
            Self::WebsiteAverageTime { website } => {
                format!("Average banner answer time on {}", website)
            }
            Self::DeviceAccepts { device } => format!("Total accepts on {}", device),
            Self::TotalAccepts => "Total accepts on all devices".to_string(),
            Self::DeviceAverageTime { device } => format!("Average {} banner answer time", device),
            Self::TotalAverageTime => "Average banner answer time on all devices".to_string(),
            Self::CookieQuestionsScore => "Q3. Cookie questions score".to_string(),
            Self::AgeInt => "Q11. Age".to_string(),
            Self::UnderstandCookieConsentInt => "Q4. Understanding of cookie consent".to_string(),
            Self::AverageWithdrawalTime => "Average withdrawal time".to_string(),
            Self::AverageConsentGivenWithdrawalTime => {
                "Average consent time where consent was later withdrawn".to_string()
            }
        }
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn design() -> StudyDesign {
        StudyDesign::new(&["computer", "phone"], &["news", "shop", "blog"])
    }

    #[test]
    fn test_parse_round_trips_every_kind() {
        let design = design();
        let names = [
            "computer.news.answer.int",
            "phone.shop.time",
            "phone.blog.withdrawal_time",
            "news_accepts_int",
            "shop_average_time",
            "computer_accepts",
            "total_accepts",
            "phone_average_time",
            "total_average_time",
            "cookie_questions_score",
            "age_int",
            "understand_cookie_consent_int",
            "average_withdrawal_times",
            "average_consent_given_withdrawal_times",
        ];
        for name in names {
            let column = Column::parse(name, &design).unwrap();
            assert_eq!(column.name(), name);
        }
    }

    #[test]
    fn test_average_time_resolves_device_or_website() {
        let design = design();
        assert_eq!(
            Column::parse("phone_average_time", &design).unwrap(),
            Column::DeviceAverageTime {
                device: "phone".to_string()
            }
        );
        assert_eq!(
            Column::parse("blog_average_time", &design).unwrap(),
            Column::WebsiteAverageTime {
                website: "blog".to_string()
            }
        );
    }

    #[test]
    fn test_unknown_names_are_missing_columns() {
        let design = design();
        for name in [
            "tablet_accepts",
            "tablet.news.time",
            "phone.forum.answer.int",
            "phone.news.colour",
            "phone.news",
            "favourite_colour",
        ] {
            assert!(
                matches!(
                    Column::parse(name, &design),
                    Err(AnalysisError::MissingColumn { .. })
                ),
                "{} should be a missing column",
                name
            );
        }
    }

    #[test]
    fn test_descriptions() {
        let design = design();
        assert_eq!(
            Column::parse("phone_accepts", &design).unwrap().description(),
            "Total accepts on phone"
        );
        assert_eq!(
            Column::TotalAverageTime.description(),
            "Average banner answer time on all devices"
        );
    }
}
