//! Survey answers with fixed vocabularies
//!
//! Each categorical question deserializes from the exact answer text of the
//! survey export, so the ETL step can hand records over without recoding.

use serde::{Deserialize, Serialize};

/// Declare a fixed-vocabulary answer type with its survey labels
macro_rules! survey_answer {
    (
        $(#[$meta:meta])*
        $name:ident { $( $variant:ident => $label:literal ),+ $(,)? }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(
                #[serde(rename = $label)]
                $variant,
            )+
        }

        impl $name {
            /// Every answer option, in questionnaire order
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// Answer text as shown in the questionnaire
            pub fn label(self) -> &'static str {
                match self {
                    $($name::$variant => $label,)+
                }
            }
        }
    };
}

survey_answer! {
    /// Q1. How concerned the participant is about privacy
    PrivacyConcern {
        VeryConcerned => "Very concerned",
        QuiteConcerned => "Quite concerned",
        SlightlyConcerned => "Slightly concerned",
        DontKnow => "Don't know",
    }
}

survey_answer! {
    /// Q2. Whether the participant knows what cookies are
    YesNo {
        Yes => "Yes",
        No => "No",
    }
}

survey_answer! {
    /// Q4. Self-reported understanding of what consent banners ask for
    ConsentUnderstanding {
        GreatExtent => "To a great extent",
        SomeExtent => "To some extent",
        NeitherNor => "Neither nor",
        SmallExtent => "To a small extent",
        NotAtAll => "Not at all",
        DontKnow => "Don't know",
    }
}

survey_answer! {
    /// Q6. Feeling about information being shared through cookies
    SharingFeeling {
        AsLittleAsPossible => "I want as little information as possible about me and my online activity to be saved and shared.",
        WantsSharing => "I want information about me and my online activity to be saved and shared, since it improves my user experience.",
        Indifferent => "I am indifferent to my information and online activity being saved and shared.",
        DontKnow => "Don't know",
    }
}

survey_answer! {
    /// Q7. Usual reaction to cookie consent banners
    BannerResponse {
        Ignore => "I ignore them and leave them open.",
        EasiestOption => "I choose the easiest option, whether it's accept or decline.",
        DeclineWhenEasy => "I try to decline when possible, but accept if rejecting is too much effort.",
        ActivelyWithhold => "I actively take steps to withhold my consent.",
        ConsentForExperience => "I consent because it improves my user experience.",
        DontKnow => "Don't know",
    }
}

survey_answer! {
    /// Yes / no questions that also offer "don't know" (Q8, Q9)
    YesNoDontKnow {
        Yes => "Yes",
        No => "No",
        DontKnow => "Don't know",
    }
}

survey_answer! {
    /// Q11. Age bracket
    AgeGroup {
        From15To19 => "15 - 19 years",
        From20To29 => "20 - 29 years",
        From30To39 => "30 - 39 years",
        From40To49 => "40 - 49 years",
        From50To59 => "50 - 59 years",
        Over60 => "60+ years",
    }
}

survey_answer! {
    /// Q12. IT-related background
    ItBackground {
        ProgrammingOrDesign => "Yes, programming and/or design related",
        Other => "Yes, other",
        No => "No",
    }
}

impl ConsentUnderstanding {
    /// Likert score, 5 = to a great extent, 1 = not at all
    pub fn likert(self) -> Option<i32> {
        match self {
            Self::GreatExtent => Some(5),
            Self::SomeExtent => Some(4),
            Self::NeitherNor => Some(3),
            Self::SmallExtent => Some(2),
            Self::NotAtAll => Some(1),
            Self::DontKnow => None,
        }
    }
}

impl AgeGroup {
    /// Representative age of the bracket (35 stands for 30-39)
    pub fn representative_age(self) -> i32 {
        match self {
            Self::From15To19 => 17,
            Self::From20To29 => 25,
            Self::From30To39 => 35,
            Self::From40To49 => 45,
            Self::From50To59 => 55,
            Self::Over60 => 65,
        }
    }
}

/// One participant's questionnaire answers; `None` means unanswered
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SurveyAnswers {
    pub privacy_concern: Option<PrivacyConcern>,
    pub knows_cookies: Option<YesNo>,
    pub understand_cookie_consent: Option<ConsentUnderstanding>,
    pub cookie_sharing_feeling: Option<SharingFeeling>,
    pub cookie_banner_response: Option<BannerResponse>,
    pub have_withdrawn_consent: Option<YesNoDontKnow>,
    pub aware_withdrawal_ease: Option<YesNoDontKnow>,
    pub age: Option<AgeGroup>,
    pub it_background: Option<ItBackground>,
    /// Q3 statements correctly checked
    pub cookie_questions_correct: u32,
    /// Q3 statements wrongly checked
    pub cookie_questions_wrong: u32,
}

impl SurveyAnswers {
    /// Cookie knowledge score: correct minus incorrect checked statements
    pub fn cookie_questions_score(&self) -> i32 {
        self.cookie_questions_correct as i32 - self.cookie_questions_wrong as i32
    }

    pub fn age_int(&self) -> Option<i32> {
        self.age.map(AgeGroup::representative_age)
    }

    pub fn understand_cookie_consent_int(&self) -> Option<i32> {
        self.understand_cookie_consent
            .and_then(ConsentUnderstanding::likert)
    }
}

/// Quantitative questionnaire items, for answer-count reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SurveyQuestion {
    PrivacyConcern,
    KnowsCookies,
    UnderstandCookieConsent,
    CookieSharingFeeling,
    CookieBannerResponse,
    HaveWithdrawnConsent,
    AwareWithdrawalEase,
    Age,
    ItBackground,
}

impl SurveyQuestion {
    pub const ALL: &'static [SurveyQuestion] = &[
        Self::PrivacyConcern,
        Self::KnowsCookies,
        Self::UnderstandCookieConsent,
        Self::CookieSharingFeeling,
        Self::CookieBannerResponse,
        Self::HaveWithdrawnConsent,
        Self::AwareWithdrawalEase,
        Self::Age,
        Self::ItBackground,
    ];

    pub fn text(self) -> &'static str {
        match self {
            Self::PrivacyConcern => "Q1. Privacy is about your right, as far as possible, to decide for yourself over your own personal data. To what extent are you concerned about privacy?",
            Self::KnowsCookies => "Q2. Do you know what cookies are?",
            Self::UnderstandCookieConsent => "Q4. Most websites ask for consent to collect information about you through cookies. To what extent would you say you understand what kind of information different websites request permission to collect?",
            Self::CookieSharingFeeling => "Q6. Which statement best describes how you feel about sharing your information through cookies?",
            Self::CookieBannerResponse => "Q7. How do you usually respond to cookie consent banners?",
            Self::HaveWithdrawnConsent => "Q8. Have you ever withdrawn your consent to cookies, after first having given it?",
            Self::AwareWithdrawalEase => "Q9. Were you aware that legally, withdrawing consent must be as easy as giving it?",
            Self::Age => "Q11. How old are you?",
            Self::ItBackground => "Q12. Do you have an IT-related background?",
        }
    }

    /// Every answer option of the question
    pub fn options(self) -> Vec<&'static str> {
        fn labels<T: Copy>(all: &[T], label: fn(T) -> &'static str) -> Vec<&'static str> {
            all.iter().map(|v| label(*v)).collect()
        }

        match self {
            Self::PrivacyConcern => labels(PrivacyConcern::ALL, PrivacyConcern::label),
            Self::KnowsCookies => labels(YesNo::ALL, YesNo::label),
            Self::UnderstandCookieConsent => {
                labels(ConsentUnderstanding::ALL, ConsentUnderstanding::label)
            }
            Self::CookieSharingFeeling => labels(SharingFeeling::ALL, SharingFeeling::label),
            Self::CookieBannerResponse => labels(BannerResponse::ALL, BannerResponse::label),
            Self::HaveWithdrawnConsent | Self::AwareWithdrawalEase => {
                labels(YesNoDontKnow::ALL, YesNoDontKnow::label)
            }
            Self::Age => labels(AgeGroup::ALL, AgeGroup::label),
            Self::ItBackground => labels(ItBackground::ALL, ItBackground::label),
        }
    }

    /// The participant's answer text, if any
    pub fn answer(self, answers: &SurveyAnswers) -> Option<&'static str> {
        match self {
            Self::PrivacyConcern => answers.privacy_concern.map(PrivacyConcern::label),
            Self::KnowsCookies => answers.knows_cookies.map(YesNo::label),
            Self::UnderstandCookieConsent => answers
                .understand_cookie_consent
                .map(ConsentUnderstanding::label),
            Self::CookieSharingFeeling => answers.cookie_sharing_feeling.map(SharingFeeling::label),
            Self::CookieBannerResponse => answers.cookie_banner_response.map(BannerResponse::label),
            Self::HaveWithdrawnConsent => answers.have_withdrawn_consent.map(YesNoDontKnow::label),
            Self::AwareWithdrawalEase => answers.aware_withdrawal_ease.map(YesNoDontKnow::label),
            Self::Age => answers.age.map(AgeGroup::label),
            Self::ItBackground => answers.it_background.map(ItBackground::label),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_answers_deserialize_from_survey_text() {
        let json = r#"{
            "privacy_concern": "Very concerned",
            "age": "30 - 39 years",
            "it_background": "Yes, other",
            "cookie_questions_correct": 4,
            "cookie_questions_wrong": 1
        }"#;
        let answers: SurveyAnswers = serde_json::from_str(json).unwrap();
        assert_eq!(answers.privacy_concern, Some(PrivacyConcern::VeryConcerned));
        assert_eq!(answers.age_int(), Some(35));
        assert_eq!(answers.it_background, Some(ItBackground::Other));
        assert_eq!(answers.knows_cookies, None);
        assert_eq!(answers.cookie_questions_score(), 3);
    }

    #[test]
    fn test_unknown_answer_text_is_rejected() {
        let json = r#"{"privacy_concern": "Extremely concerned"}"#;
        assert!(serde_json::from_str::<SurveyAnswers>(json).is_err());
    }

    #[test]
    fn test_likert_mapping() {
        assert_eq!(ConsentUnderstanding::GreatExtent.likert(), Some(5));
        assert_eq!(ConsentUnderstanding::NotAtAll.likert(), Some(1));
        assert_eq!(ConsentUnderstanding::DontKnow.likert(), None);
    }

    #[test]
    fn test_negative_knowledge_score() {
        let answers = SurveyAnswers {
            cookie_questions_correct: 1,
            cookie_questions_wrong: 3,
            ..SurveyAnswers::default()
        };
        assert_eq!(answers.cookie_questions_score(), -2);
    }

    #[test]
    fn test_question_options_cover_answers() {
        let answers = SurveyAnswers {
            have_withdrawn_consent: Some(YesNoDontKnow::DontKnow),
            ..SurveyAnswers::default()
        };
        let question = SurveyQuestion::HaveWithdrawnConsent;
        let answer = question.answer(&answers).unwrap();
        assert!(question.options().contains(&answer));
        assert_eq!(SurveyQuestion::Age.options().len(), 6);
        assert!(SurveyQuestion::Age.text().starts_with("Q11."));
    }
}
