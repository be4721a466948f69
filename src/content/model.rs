use serde::{Deserialize, Serialize};

/// Question variants a section can hold.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum QuestionType {
    TrueFalseNotGiven,
    YesNoNotGiven,
    MultipleChoice,
    Matching,
    Completion,
    ShortAnswer,
    MatchingHeadings,
    MatchingInformation,
}

/// How a response is compared against the canonical answer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Comparison {
    /// A fixed label or option letter (TRUE, NOT GIVEN, B).
    Label,
    /// A short code picked from a shared list (a heading numeral, a paragraph letter).
    Code,
    /// Words written by the candidate.
    FreeText,
}

impl QuestionType {
    pub fn comparison(self) -> Comparison {
        match self {
            QuestionType::TrueFalseNotGiven
            | QuestionType::YesNoNotGiven
            | QuestionType::MultipleChoice => Comparison::Label,
            QuestionType::Matching
            | QuestionType::MatchingHeadings
            | QuestionType::MatchingInformation => Comparison::Code,
            QuestionType::Completion | QuestionType::ShortAnswer => Comparison::FreeText,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            QuestionType::TrueFalseNotGiven => "True / False / Not Given",
            QuestionType::YesNoNotGiven => "Yes / No / Not Given",
            QuestionType::MultipleChoice => "Multiple choice",
            QuestionType::Matching => "Matching",
            QuestionType::Completion => "Completion",
            QuestionType::ShortAnswer => "Short answer",
            QuestionType::MatchingHeadings => "Matching headings",
            QuestionType::MatchingInformation => "Matching information",
        }
    }
}

/// Inclusive range of paragraph letters a matching-information answer may use.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LetterRange {
    pub from: char,
    pub to: char,
}

impl LetterRange {
    pub fn letters(&self) -> Vec<char> {
        let from = self.from.to_ascii_uppercase();
        let to = self.to.to_ascii_uppercase();
        (from..=to).filter(|c| c.is_ascii_uppercase()).collect()
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub number: u32,
    pub prompt: String,
    /// Canonical answer. Items authored without one can never be marked correct.
    #[serde(default)]
    pub answer: Option<String>,
    #[serde(default)]
    pub options: Vec<String>,
    #[serde(default)]
    pub paragraph: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Section {
    pub rubric: String,
    #[serde(default)]
    pub instruction: String,
    #[serde(rename = "type")]
    pub kind: QuestionType,
    pub items: Vec<Item>,
    /// Shared heading list for matching-headings, numbered i, ii, iii...
    #[serde(default)]
    pub headings: Vec<String>,
    /// Shared option list for matching, lettered A, B, C...
    #[serde(default)]
    pub options: Vec<String>,
    #[serde(default)]
    pub letter_range: Option<LetterRange>,
}

impl Section {
    /// Every response the item accepts, in display order. Empty for free-text variants.
    pub fn choices(&self, item: &Item) -> Vec<String> {
        match self.kind {
            QuestionType::TrueFalseNotGiven => {
                vec!["TRUE".into(), "FALSE".into(), "NOT GIVEN".into()]
            }
            QuestionType::YesNoNotGiven => vec!["YES".into(), "NO".into(), "NOT GIVEN".into()],
            QuestionType::MultipleChoice => option_letters(item.options.len()),
            QuestionType::Matching => {
                let count = if item.options.is_empty() {
                    self.options.len()
                } else {
                    item.options.len()
                };
                option_letters(count)
            }
            QuestionType::MatchingHeadings => {
                (1..=self.headings.len()).map(roman_numeral).collect()
            }
            QuestionType::MatchingInformation => self
                .letter_range
                .map(|r| r.letters().into_iter().map(String::from).collect::<Vec<_>>())
                .unwrap_or_default(),
            QuestionType::Completion | QuestionType::ShortAnswer => Vec::new(),
        }
    }

    /// Plain text of the section as shown in the question pane.
    pub fn plain_text(&self) -> String {
        let mut out = String::new();
        out.push_str(&self.rubric);
        out.push('\n');
        if !self.instruction.is_empty() {
            out.push_str(&self.instruction);
            out.push('\n');
        }
        for (i, heading) in self.headings.iter().enumerate() {
            out.push_str(&format!("  {}  {heading}\n", roman_numeral(i + 1)));
        }
        for (letter, option) in option_letters(self.options.len()).iter().zip(&self.options) {
            out.push_str(&format!("  {letter}  {option}\n"));
        }
        for item in &self.items {
            out.push('\n');
            match &item.paragraph {
                Some(p) => out.push_str(&format!("{}. Paragraph {p}: {}\n", item.number, item.prompt)),
                None => out.push_str(&format!("{}. {}\n", item.number, item.prompt)),
            }
            for (letter, option) in option_letters(item.options.len()).iter().zip(&item.options) {
                out.push_str(&format!("   {letter}  {option}\n"));
            }
        }
        out
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Test {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub subtitle: String,
    pub passage: String,
    pub sections: Vec<Section>,
}

impl Test {
    pub fn items(&self) -> impl Iterator<Item = (&Section, &Item)> {
        self.sections
            .iter()
            .flat_map(|s| s.items.iter().map(move |item| (s, item)))
    }

    pub fn item(&self, number: u32) -> Option<(&Section, &Item)> {
        self.items().find(|(_, item)| item.number == number)
    }

    /// Index of the section holding question `number`.
    pub fn section_of(&self, number: u32) -> Option<usize> {
        self.sections
            .iter()
            .position(|s| s.items.iter().any(|item| item.number == number))
    }

    pub fn question_numbers(&self) -> Vec<u32> {
        self.items().map(|(_, item)| item.number).collect()
    }

    pub fn item_count(&self) -> usize {
        self.sections.iter().map(|s| s.items.len()).sum()
    }
}

pub fn option_letters(count: usize) -> Vec<String> {
    ('A'..='Z').take(count).map(String::from).collect()
}

pub fn roman_numeral(mut n: usize) -> String {
    const TABLE: [(usize, &str); 9] = [
        (100, "c"),
        (90, "xc"),
        (50, "l"),
        (40, "xl"),
        (10, "x"),
        (9, "ix"),
        (5, "v"),
        (4, "iv"),
        (1, "i"),
    ];
    let mut out = String::new();
    for &(value, digits) in &TABLE {
        while n >= value {
            out.push_str(digits);
            n -= value;
        }
    }
    out
}
