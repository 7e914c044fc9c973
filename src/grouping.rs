// Survey-derived subgroup splits
//
// Each split pairs an affirmative predicate with an explicit-other predicate.
// They are not complements: participants matching neither side (typically
// "don't know" or middle answers) are left out of both groups.

use crate::dataset::survey::{
    AgeGroup, ConsentUnderstanding, ItBackground, PrivacyConcern, SharingFeeling, YesNoDontKnow,
};
use crate::dataset::{Dataset, RowSubset, SurveyAnswers};

/// Predicate over one participant's survey answers
pub type SurveyPredicate = fn(&SurveyAnswers) -> bool;

/// Two named, disjoint subgroups defined by survey predicates
#[derive(Debug, Clone)]
pub struct GroupSplit {
    /// Identifier used as the grouping key in aggregated results
    pub name: String,
    pub group_names: [String; 2],
    pub predicates: [SurveyPredicate; 2],
}

impl GroupSplit {
    pub fn new(name: &str, group_names: [&str; 2], predicates: [SurveyPredicate; 2]) -> Self {
        Self {
            name: name.to_string(),
            group_names: group_names.map(str::to_string),
            predicates,
        }
    }
}

/// Split dataset rows into the two groups of `split`
///
/// A row matching the first predicate goes to the first group even if it
/// would also match the second, so the groups never overlap.
///
/// # Example
/// ```
/// use consentlab::config::StudyDesign;
/// use consentlab::dataset::{Dataset, Participant, SurveyAnswers};
/// use consentlab::dataset::survey::YesNoDontKnow;
/// use consentlab::grouping::{default_splits, partition};
///
/// let answered = |id: &str, answer| Participant::new(id, SurveyAnswers {
///     have_withdrawn_consent: answer,
///     ..SurveyAnswers::default()
/// });
/// let dataset = Dataset::new(StudyDesign::default(), vec![
///     answered("a", Some(YesNoDontKnow::Yes)),
///     answered("b", Some(YesNoDontKnow::DontKnow)),
///     answered("c", Some(YesNoDontKnow::No)),
/// ]).unwrap();
///
/// let split = default_splits().into_iter().find(|s| s.name == "have_withdrawn_consent").unwrap();
/// let [yes, no] = partition(&dataset, &split);
/// assert_eq!(yes.rows, vec![0]);
/// assert_eq!(no.rows, vec![2]);
/// ```
pub fn partition(dataset: &Dataset, split: &GroupSplit) -> [RowSubset; 2] {
    let mut first = Vec::new();
    let mut second = Vec::new();
    for (row, participant) in dataset.participants().iter().enumerate() {
        if (split.predicates[0])(&participant.survey) {
            first.push(row);
        } else if (split.predicates[1])(&participant.survey) {
            second.push(row);
        }
    }

    tracing::debug!(
        split = %split.name,
        first = first.len(),
        second = second.len(),
        excluded = dataset.len() - first.len() - second.len(),
        "partitioned participants"
    );

    [
        RowSubset::new(split.group_names[0].clone(), first),
        RowSubset::new(split.group_names[1].clone(), second),
    ]
}

/// The seven study splits, in report order
pub fn default_splits() -> Vec<GroupSplit> {
    vec![
        GroupSplit::new(
            "privacy_concern",
            ["Q1. Very concerned", "Q1. Quite or slightly concerned"],
            [
                |s| s.privacy_concern == Some(PrivacyConcern::VeryConcerned),
                |s| {
                    matches!(
                        s.privacy_concern,
                        Some(PrivacyConcern::QuiteConcerned | PrivacyConcern::SlightlyConcerned)
                    )
                },
            ],
        ),
        GroupSplit::new(
            "understand_cookie_consent",
            [
                "Q4. Understands to a great or some extent",
                "Q4. Understands to a small extent or not at all",
            ],
            [
                |s| {
                    matches!(
                        s.understand_cookie_consent,
                        Some(ConsentUnderstanding::GreatExtent | ConsentUnderstanding::SomeExtent)
                    )
                },
                |s| {
                    matches!(
                        s.understand_cookie_consent,
                        Some(ConsentUnderstanding::SmallExtent | ConsentUnderstanding::NotAtAll)
                    )
                },
            ],
        ),
        GroupSplit::new(
            "cookie_sharing_feeling",
            [
                "Q6. Wants as little sharing as possible",
                "Q6. Wants sharing or is indifferent",
            ],
            [
                |s| s.cookie_sharing_feeling == Some(SharingFeeling::AsLittleAsPossible),
                |s| {
                    matches!(
                        s.cookie_sharing_feeling,
                        Some(SharingFeeling::WantsSharing | SharingFeeling::Indifferent)
                    )
                },
            ],
        ),
        GroupSplit::new(
            "have_withdrawn_consent",
            ["Q8. Has withdrawn consent", "Q8. Has not withdrawn consent"],
            [
                |s| s.have_withdrawn_consent == Some(YesNoDontKnow::Yes),
                |s| s.have_withdrawn_consent == Some(YesNoDontKnow::No),
            ],
        ),
        GroupSplit::new(
            "aware_withdrawal_ease",
            [
                "Q9. Aware withdrawal must be easy",
                "Q9. Not aware withdrawal must be easy",
            ],
            [
                |s| s.aware_withdrawal_ease == Some(YesNoDontKnow::Yes),
                |s| s.aware_withdrawal_ease == Some(YesNoDontKnow::No),
            ],
        ),
        GroupSplit::new(
            "age",
            ["Q11. Under 30", "Q11. 30 or older"],
            [
                |s| matches!(s.age, Some(AgeGroup::From15To19 | AgeGroup::From20To29)),
                |s| {
                    matches!(
                        s.age,
                        Some(
                            AgeGroup::From30To39
                                | AgeGroup::From40To49
                                | AgeGroup::From50To59
                                | AgeGroup::Over60
                        )
                    )
                },
            ],
        ),
        GroupSplit::new(
            "it_background",
            ["Q12. IT background", "Q12. No IT background"],
            [
                |s| {
                    matches!(
                        s.it_background,
                        Some(ItBackground::ProgrammingOrDesign | ItBackground::Other)
                    )
                },
                |s| s.it_background == Some(ItBackground::No),
            ],
        ),
    ]
}
