use serde::{Deserialize, Serialize};

/// How requirement tests are installed into the workspace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProjectKind {
    /// Tests accumulate; every earlier test must keep passing.
    #[default]
    Single,
    /// Breaking changes allowed; each checkpoint replaces the test files.
    Checkpoints,
}

/// One functional unit to implement, verified by a dedicated test.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Requirement {
    pub name: String,
    pub description: String,
    /// Template-relative paths of image attachments. Only the first is sent.
    #[serde(default)]
    pub attachments: Vec<String>,
    #[serde(default = "default_score")]
    pub score: u32,
}

fn default_score() -> u32 {
    1
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "type", default)]
    pub kind: ProjectKind,
    pub requirements: Vec<Requirement>,
}

impl Project {
    /// Max scores in requirement order, used to seed `ProjectStats`.
    pub fn max_scores(&self) -> impl Iterator<Item = u32> + '_ {
        self.requirements.iter().map(|r| r.score)
    }

    pub fn total_score(&self) -> u32 {
        self.requirements.iter().map(|r| r.score).sum()
    }
}
