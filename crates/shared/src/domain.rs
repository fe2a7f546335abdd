use serde::{Deserialize, Serialize};

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                self.0.fmt(f)
            }
        }
    };
}

id_newtype!(WinnerId);
id_newtype!(PhotoId);

/// One award recipient as it appears in the award data document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WinnerRecord {
    pub id: WinnerId,
    pub department: String,
    pub award_type: String,
    pub recipient_name: String,
    #[serde(default)]
    pub achievements: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo_url: Option<String>,
}

impl WinnerRecord {
    /// The displayable photo reference, treating an empty string as absent.
    pub fn photo(&self) -> Option<&str> {
        self.photo_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
    }
}

/// The document every award source yields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AwardData {
    pub title: String,
    pub subtitle: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    pub winners: Vec<WinnerRecord>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AwardCategory {
    Service,
    Rock,
    Excellence,
}

impl AwardCategory {
    pub const ALL: [AwardCategory; 3] = [
        AwardCategory::Service,
        AwardCategory::Rock,
        AwardCategory::Excellence,
    ];

    pub fn label(self) -> &'static str {
        match self {
            AwardCategory::Service => "年資獎",
            AwardCategory::Rock => "磐石獎",
            AwardCategory::Excellence => "優質獎",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionKind {
    FirstHalf,
    SecondHalf,
    #[serde(rename = "service_25_year")]
    Service25Year,
    #[serde(rename = "service_15_year")]
    Service15Year,
    #[serde(rename = "service_10_year")]
    Service10Year,
    Rock,
    Excellence,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PerformanceKind {
    Violin,
    Choir,
    Dance,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MainVariant {
    Opening,
    Toast,
    Dining,
    Celebration,
}

impl MainVariant {
    /// Fixed headline for the interlude variants. The opening card takes its
    /// headline from the award data instead.
    pub fn headline(self) -> Option<(&'static str, &'static str)> {
        match self {
            MainVariant::Opening => None,
            MainVariant::Toast => Some(("全體敬酒", "Group Toast Ceremony")),
            MainVariant::Dining => Some(("用餐時間", "Dining Time")),
            MainVariant::Celebration => Some(("歡敬時間", "Social Hour")),
        }
    }
}

/// One screen of the presentation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SlideDescriptor {
    Main {
        variant: MainVariant,
        title: String,
        subtitle: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        date: Option<String>,
    },
    Performance {
        kind: PerformanceKind,
        #[serde(default)]
        performers: Vec<String>,
    },
    ChairmanAddress,
    SectionTitle {
        section: SectionKind,
    },
    AwardCard {
        winner_id: WinnerId,
    },
}

impl SlideDescriptor {
    pub fn winner_id(&self) -> Option<WinnerId> {
        match self {
            SlideDescriptor::AwardCard { winner_id } => Some(*winner_id),
            _ => None,
        }
    }

    pub fn is_section(&self, kind: SectionKind) -> bool {
        matches!(self, SlideDescriptor::SectionTitle { section } if *section == kind)
    }

    pub fn is_performance(&self, performance: PerformanceKind) -> bool {
        matches!(self, SlideDescriptor::Performance { kind, .. } if *kind == performance)
    }
}

#[cfg(test)]
#[path = "tests/domain_tests.rs"]
mod tests;
