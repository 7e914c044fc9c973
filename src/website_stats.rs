// Descriptive summaries per website and device
//
// Series are built from the raw per-cell columns over every participant:
// one series per (website, device), pooled across devices per website, and
// the same again across all websites by concatenation.

use crate::config::StudyConfig;
use crate::dataset::{Column, Dataset};
use crate::error::{AnalysisError, Result};
use crate::repeated::{run_device_wilcoxon_test, run_repeated_measures, ConditionMatrix};
use crate::repeated::{FamilyOutcome, Grouping, PairwiseResult, Scale};
use crate::stats::{mean, std_dev};
use serde::{Deserialize, Serialize};

/// Label of the series concatenated over every website
pub const ALL_WEBSITES: &str = "all_websites";

/// Accept and response-time statistics of one series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesSummary {
    /// Recorded decisions
    pub n_decisions: usize,
    pub accepts: usize,
    pub accept_rate: Option<f64>,
    /// SD of the 0/1 decisions
    pub accept_sd: Option<f64>,
    /// Recorded response times
    pub n_times: usize,
    pub mean_time: Option<f64>,
    pub sd_time: Option<f64>,
}

impl SeriesSummary {
    /// Summarize present decisions (0/1) and present response times
    pub fn from_series(decisions: &[f64], times: &[f64]) -> Self {
        Self {
            n_decisions: decisions.len(),
            accepts: decisions.iter().filter(|&&d| d == 1.0).count(),
            accept_rate: mean(decisions),
            accept_sd: std_dev(decisions),
            n_times: times.len(),
            mean_time: mean(times),
            sd_time: std_dev(times),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceSummary {
    pub device: String,
    pub summary: SeriesSummary,
}

/// Per-device and pooled summaries of one website, or of all websites
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebsiteSummary {
    pub website: String,
    pub devices: Vec<DeviceSummary>,
    pub pooled: SeriesSummary,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebsiteStatistics {
    /// In design order
    pub websites: Vec<WebsiteSummary>,
    pub all_websites: WebsiteSummary,
}

impl WebsiteStatistics {
    pub fn website(&self, website: &str) -> Option<&WebsiteSummary> {
        self.websites.iter().find(|w| w.website == website)
    }
}

/// Accept percentage per device over all websites
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AcceptPercentages {
    pub devices: Vec<(String, Option<f64>)>,
    /// Unweighted average of the device percentages that exist
    pub average: Option<f64>,
}

/// Device-paired signed-rank tests for one website, or all websites pooled
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceComparison {
    pub website: String,
    pub devices: (String, String),
    pub accepts: PairwiseResult,
    pub time: PairwiseResult,
}

#[derive(Default)]
struct Series {
    decisions: Vec<f64>,
    times: Vec<f64>,
}

impl Series {
    fn extend(&mut self, other: &Series) {
        self.decisions.extend_from_slice(&other.decisions);
        self.times.extend_from_slice(&other.times);
    }

    fn summary(&self) -> SeriesSummary {
        SeriesSummary::from_series(&self.decisions, &self.times)
    }
}

fn cell_series(dataset: &Dataset, device: &str, website: &str) -> Result<Series> {
    let rows = dataset.all_rows();
    let (device, website) = (device.to_string(), website.to_string());
    Ok(Series {
        decisions: dataset.present_values(
            &Column::Answer {
                device: device.clone(),
                website: website.clone(),
            },
            &rows,
        )?,
        times: dataset.present_values(&Column::Time { device, website }, &rows)?,
    })
}

/// Summaries per website and device, pooled, and across all websites
///
/// # Example
/// ```
/// use consentlab::config::StudyDesign;
/// use consentlab::dataset::{Dataset, Decision, Observation, Participant, SurveyAnswers};
/// use consentlab::website_stats::website_statistics;
///
/// let design = StudyDesign::new(&["phone"], &["news", "shop"]);
/// let participant = Participant::new("p1", SurveyAnswers::default())
///     .observe(Observation::new("phone", "news", Some(Decision::Accept), Some(3.0)))
///     .observe(Observation::new("phone", "shop", Some(Decision::Reject), Some(5.0)));
/// let dataset = Dataset::new(design, vec![participant]).unwrap();
///
/// let stats = website_statistics(&dataset).unwrap();
/// assert_eq!(stats.website("news").unwrap().pooled.accepts, 1);
/// assert_eq!(stats.all_websites.pooled.mean_time, Some(4.0));
/// ```
pub fn website_statistics(dataset: &Dataset) -> Result<WebsiteStatistics> {
    let design = dataset.design();
    let mut per_device_total: Vec<Series> = design.devices.iter().map(|_| Series::default()).collect();
    let mut websites = Vec::with_capacity(design.websites.len());

    for website in &design.websites {
        let mut pooled = Series::default();
        let mut devices = Vec::with_capacity(design.devices.len());
        for (device, total) in design.devices.iter().zip(per_device_total.iter_mut()) {
            let series = cell_series(dataset, device, website)?;
            pooled.extend(&series);
            total.extend(&series);
            devices.push(DeviceSummary {
                device: device.clone(),
                summary: series.summary(),
            });
        }
        websites.push(WebsiteSummary {
            website: website.clone(),
            devices,
            pooled: pooled.summary(),
        });
    }

    let mut pooled = Series::default();
    for total in &per_device_total {
        pooled.extend(total);
    }
    let all_websites = WebsiteSummary {
        website: ALL_WEBSITES.to_string(),
        devices: design
            .devices
            .iter()
            .zip(&per_device_total)
            .map(|(device, series)| DeviceSummary {
                device: device.clone(),
                summary: series.summary(),
            })
            .collect(),
        pooled: pooled.summary(),
    };

    tracing::debug!(
        websites = websites.len(),
        decisions = all_websites.pooled.n_decisions,
        "website statistics computed"
    );

    Ok(WebsiteStatistics {
        websites,
        all_websites,
    })
}

/// Percentage of accepted banners per device, and their average
pub fn accept_percentages(dataset: &Dataset) -> Result<AcceptPercentages> {
    let stats = website_statistics(dataset)?;
    let devices: Vec<(String, Option<f64>)> = stats
        .all_websites
        .devices
        .into_iter()
        .map(|d| (d.device, d.summary.accept_rate.map(|rate| rate * 100.0)))
        .collect();
    let present: Vec<f64> = devices.iter().filter_map(|(_, p)| *p).collect();
    Ok(AcceptPercentages {
        average: mean(&present),
        devices,
    })
}

/// Device-paired signed-rank tests on accepts and time, per website and pooled
///
/// Runs for every pair of configured devices. The pooled comparison pairs
/// each participant's values website by website, so every (participant,
/// website) cell with both devices present contributes one pair.
pub fn device_comparisons(dataset: &Dataset, config: &StudyConfig) -> Result<Vec<DeviceComparison>> {
    let design = dataset.design();
    let mut comparisons = Vec::new();

    for (i, first) in design.devices.iter().enumerate() {
        for second in &design.devices[i + 1..] {
            for website in &design.websites {
                let column = |device: &String, time: bool| {
                    let (device, website) = (device.clone(), website.clone());
                    if time {
                        Column::Time { device, website }
                    } else {
                        Column::Answer { device, website }
                    }
                };
                comparisons.push(DeviceComparison {
                    website: website.clone(),
                    devices: (first.clone(), second.clone()),
                    accepts: run_device_wilcoxon_test(
                        dataset,
                        &column(first, false),
                        &column(second, false),
                        config,
                    )?,
                    time: run_device_wilcoxon_test(
                        dataset,
                        &column(first, true),
                        &column(second, true),
                        config,
                    )?,
                });
            }

            comparisons.push(DeviceComparison {
                website: ALL_WEBSITES.to_string(),
                devices: (first.clone(), second.clone()),
                accepts: pooled_device_test(dataset, first, second, false, config)?,
                time: pooled_device_test(dataset, first, second, true, config)?,
            });
        }
    }

    Ok(comparisons)
}

fn pooled_device_test(
    dataset: &Dataset,
    first: &str,
    second: &str,
    time: bool,
    config: &StudyConfig,
) -> Result<PairwiseResult> {
    let mut rows = Vec::new();
    for website in &dataset.design().websites {
        let columns = [first, second].map(|device| {
            let (device, website) = (device.to_string(), website.clone());
            if time {
                Column::Time { device, website }
            } else {
                Column::Answer { device, website }
            }
        });
        let a = dataset.column(&columns[0])?;
        let b = dataset.column(&columns[1])?;
        rows.extend(a.into_iter().zip(b).map(|(a, b)| vec![a, b]));
    }

    let matrix = ConditionMatrix::from_rows(vec![first.to_string(), second.to_string()], rows)?;
    match run_repeated_measures(&matrix, Grouping::SinglePair, Scale::Continuous, config)? {
        FamilyOutcome::Pairwise { mut results } if results.len() == 1 => {
            Ok(results.remove(0))
        }
        _ => Err(AnalysisError::invalid_argument(
            "conditions",
            "pooled device test expects a single pair",
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StudyDesign;
    use crate::dataset::{Decision, Observation, Participant, SurveyAnswers};

    const WEBSITES: [&str; 3] = ["news", "shop", "blog"];

    fn dataset() -> Dataset {
        let design = StudyDesign::new(&["computer", "phone"], &WEBSITES);
        let participants = (0..5)
            .map(|i| {
                let mut participant = Participant::new(format!("p{}", i), SurveyAnswers::default());
                for (w, website) in WEBSITES.iter().enumerate() {
                    let computer = if (i + w) % 2 == 0 { Decision::Accept } else { Decision::Reject };
                    participant = participant
                        .observe(Observation::new(
                            "computer",
                            website,
                            Some(computer),
                            Some(2.0 + i as f64),
                        ))
                        .observe(Observation::new(
                            "phone",
                            website,
                            Some(Decision::Accept),
                            Some(1.0 + (i * w) as f64),
                        ));
                }
                participant
            })
            .collect();
        Dataset::new(design, participants).unwrap()
    }

    #[test]
    fn test_series_summary() {
        let summary = SeriesSummary::from_series(&[1.0, 0.0, 1.0, 1.0], &[2.0, 4.0]);
        assert_eq!(summary.n_decisions, 4);
        assert_eq!(summary.accepts, 3);
        assert_eq!(summary.accept_rate, Some(0.75));
        assert!((summary.accept_sd.unwrap() - 0.5).abs() < 1e-12);
        assert_eq!(summary.mean_time, Some(3.0));

        let empty = SeriesSummary::from_series(&[], &[]);
        assert_eq!(empty.accept_rate, None);
        assert_eq!(empty.sd_time, None);
    }

    #[test]
    fn test_per_website_and_pooled() {
        let stats = website_statistics(&dataset()).unwrap();
        assert_eq!(stats.websites.len(), 3);

        let news = stats.website("news").unwrap();
        assert_eq!(news.devices[0].device, "computer");
        // Computer accepts on news for i = 0, 2, 4
        assert_eq!(news.devices[0].summary.accepts, 3);
        assert_eq!(news.devices[1].summary.accepts, 5);
        assert_eq!(news.pooled.n_decisions, 10);
        assert_eq!(news.pooled.accepts, 8);

        assert_eq!(stats.all_websites.website, ALL_WEBSITES);
        assert_eq!(stats.all_websites.pooled.n_decisions, 30);
        assert_eq!(stats.all_websites.devices[1].summary.accepts, 15);
    }

    #[test]
    fn test_accept_percentages() {
        let percentages = accept_percentages(&dataset()).unwrap();
        // Computer: 3 + 2 + 3 accepts out of 15
        let computer = percentages.devices[0].1.unwrap();
        assert!((computer - 800.0 / 15.0).abs() < 1e-9);
        assert_eq!(percentages.devices[1].1, Some(100.0));
        assert!((percentages.average.unwrap() - (computer + 100.0) / 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_device_comparisons_cover_each_website_and_pool() {
        let config = StudyConfig::quick(StudyDesign::new(&["computer", "phone"], &WEBSITES));
        let comparisons = device_comparisons(&dataset(), &config).unwrap();
        assert_eq!(comparisons.len(), 4);
        assert_eq!(comparisons[3].website, ALL_WEBSITES);
        assert_eq!(comparisons[0].accepts.n, 5);
        assert_eq!(comparisons[3].time.n, 15);
        assert_eq!(
            comparisons[0].accepts.site_pair,
            ("computer.news.answer.int".to_string(), "phone.news.answer.int".to_string())
        );
    }
}
