use crate::assessment::Lang;

/// UI labels for one language.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Strings {
    pub app_title: &'static str,
    pub paste_text: &'static str,
    pub language: &'static str,
    pub check_button: &'static str,
    pub loading: &'static str,
    pub risk_score: &'static str,
    pub high_risk: &'static str,
    pub results: &'static str,
    pub teach_me: &'static str,
    pub evidence: &'static str,
    pub share_report: &'static str,
    pub error_prefix: &'static str,
    pub quiz_question: &'static str,
    pub quiz_option_1: &'static str,
    pub quiz_option_2: &'static str,
    pub quiz_correct: &'static str,
    pub quiz_incorrect: &'static str,
}

static EN: Strings = Strings {
    app_title: "Misinformation Guardian",
    paste_text: "Paste message or link here",
    language: "Language",
    check_button: "Check for Misinformation",
    loading: "Analyzing...",
    risk_score: "Risk Score",
    high_risk: "High Risk",
    results: "Results",
    teach_me: "Teach Me",
    evidence: "Evidence",
    share_report: "Share Report",
    error_prefix: "Error checking",
    quiz_question: "What is a red flag for health misinformation?",
    quiz_option_1: "Miracle cures",
    quiz_option_2: "Official sources",
    quiz_correct: "Correct! Miracle cures are often false.",
    quiz_incorrect: "Try again!",
};

static HI: Strings = Strings {
    app_title: "गलत जानकारी गार्डियन",
    paste_text: "संदेश या लिंक यहां पेस्ट करें",
    language: "भाषा",
    check_button: "गलत जानकारी की जांच करें",
    loading: "विश्लेषण कर रहे हैं...",
    risk_score: "जोखिम स्कोर",
    high_risk: "उच्च जोखिम",
    results: "परिणाम",
    teach_me: "मुझे सिखाएं",
    evidence: "साक्ष्य",
    share_report: "रिपोर्ट साझा करें",
    error_prefix: "जांच में त्रुटि",
    quiz_question: "स्वास्थ्य गलत जानकारी के लिए क्या खतरे का संकेत है?",
    quiz_option_1: "चमत्कारिक इलाज",
    quiz_option_2: "आधिकारिक स्रोत",
    quiz_correct: "सही! चमत्कारिक इलाज अक्सर झूठे होते हैं।",
    quiz_incorrect: "फिर से प्रयास करें!",
};

impl Lang {
    pub fn strings(self) -> &'static Strings {
        match self {
            Lang::En => &EN,
            Lang::Hi => &HI,
        }
    }
}
