// Integration test utilities
//
// Builders for synthetic participant tables over small study designs

#![allow(dead_code)]

use consentlab::config::{StudyConfig, StudyDesign};
use consentlab::dataset::survey::{
    AgeGroup, ConsentUnderstanding, ItBackground, PrivacyConcern, YesNoDontKnow,
};
use consentlab::dataset::{Dataset, Decision, Observation, Participant, SurveyAnswers};

pub const DEVICES: [&str; 2] = ["computer", "phone"];
pub const WEBSITES: [&str; 3] = ["news", "shop", "blog"];

pub fn small_design() -> StudyDesign {
    StudyDesign::new(&DEVICES, &WEBSITES)
}

/// Quick configuration over the small design
pub fn small_config() -> StudyConfig {
    StudyConfig::quick(small_design())
}

/// Fluent builder for one participant
pub struct ParticipantBuilder {
    participant: Participant,
}

impl ParticipantBuilder {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            participant: Participant::new(id, SurveyAnswers::default()),
        }
    }

    pub fn survey(mut self, edit: impl FnOnce(&mut SurveyAnswers)) -> Self {
        edit(&mut self.participant.survey);
        self
    }

    pub fn decision(mut self, device: &str, website: &str, accept: bool, time: f64) -> Self {
        let decision = if accept {
            Decision::Accept
        } else {
            Decision::Reject
        };
        self.participant = self
            .participant
            .observe(Observation::new(device, website, Some(decision), Some(time)));
        self
    }

    pub fn withdrawn(
        mut self,
        device: &str,
        website: &str,
        time: f64,
        withdrawal_time: f64,
    ) -> Self {
        self.participant = self.participant.observe(
            Observation::new(device, website, Some(Decision::Accept), Some(time))
                .with_withdrawal(withdrawal_time),
        );
        self
    }

    pub fn build(self) -> Participant {
        self.participant
    }
}

/// Twelve participants with varied answers, decisions and times
///
/// Decisions accept when `(i + website + device) % 3 != 0`; times grow with
/// the participant index and the website position. Participant 5 has no
/// phone observation on the last website; every fourth participant withdrew
/// consent on the computer for the first website.
pub fn study_dataset() -> Dataset {
    let understanding = ConsentUnderstanding::ALL;
    let participants = (0..12)
        .map(|i| {
            let mut builder = ParticipantBuilder::new(format!("p{:02}", i)).survey(|s| {
                s.privacy_concern = Some(match i {
                    11 => PrivacyConcern::DontKnow,
                    _ if i % 3 == 0 => PrivacyConcern::VeryConcerned,
                    _ if i % 3 == 1 => PrivacyConcern::QuiteConcerned,
                    _ => PrivacyConcern::SlightlyConcerned,
                });
                s.age = Some(if i < 6 {
                    AgeGroup::From20To29
                } else {
                    AgeGroup::From40To49
                });
                s.have_withdrawn_consent = Some(match i % 4 {
                    0 => YesNoDontKnow::Yes,
                    1 => YesNoDontKnow::No,
                    _ => YesNoDontKnow::DontKnow,
                });
                s.understand_cookie_consent = Some(understanding[i % understanding.len()]);
                s.it_background = Some(if i % 2 == 0 {
                    ItBackground::ProgrammingOrDesign
                } else {
                    ItBackground::No
                });
                s.cookie_questions_correct = (i % 5 + 1) as u32;
                s.cookie_questions_wrong = (i % 2) as u32;
            });

            for (d, device) in DEVICES.iter().enumerate() {
                for (w, website) in WEBSITES.iter().enumerate() {
                    if i == 5 && d == 1 && w == 2 {
                        continue;
                    }
                    let time = 1.5 + i as f64 * 0.25 + w as f64 + d as f64 * 0.5;
                    if i % 4 == 0 && d == 0 && w == 0 {
                        builder = builder.withdrawn(device, website, time, 10.0 + i as f64);
                    } else {
                        builder = builder.decision(device, website, (i + w + d) % 3 != 0, time);
                    }
                }
            }
            builder.build()
        })
        .collect();

    Dataset::new(small_design(), participants).expect("synthetic dataset is valid")
}

/// Single-device, single-column table with the given accept decisions per group
///
/// Group membership is encoded in the privacy-concern answer: the first group
/// answers "Very concerned", the second "Quite concerned".
pub fn two_group_accepts(first: &[bool], second: &[bool]) -> Dataset {
    let design = StudyDesign::new(&["phone"], &["a", "b"]);
    let participants = first
        .iter()
        .map(|&a| (PrivacyConcern::VeryConcerned, a))
        .chain(second.iter().map(|&a| (PrivacyConcern::QuiteConcerned, a)))
        .enumerate()
        .map(|(i, (concern, accept))| {
            ParticipantBuilder::new(format!("p{}", i))
                .survey(|s| s.privacy_concern = Some(concern))
                .decision("phone", "a", accept, 2.0)
                .build()
        })
        .collect();
    Dataset::new(design, participants).expect("synthetic dataset is valid")
}
