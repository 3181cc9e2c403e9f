//! Person value objects.

use std::fmt;
use std::str::FromStr;

use common::{AggregateId, ContactId};
use serde::{Deserialize, Serialize};

use super::PersonError;

/// Gender as offered by the profile form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
}

impl Gender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Male => "male",
            Gender::Female => "female",
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Gender {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "male" => Ok(Gender::Male),
            "female" => Ok(Gender::Female),
            other => Err(format!("unknown gender: {other}")),
        }
    }
}

/// Editable profile of a person.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PersonProfile {
    pub first_name: String,
    pub last_name: String,
    pub public_name: String,
    pub email: String,
    pub gender: Option<Gender>,
    pub abstract_text: Option<String>,
    pub description: Option<String>,
}

impl PersonProfile {
    pub fn new(public_name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            public_name: public_name.into(),
            email: email.into(),
            ..Self::default()
        }
    }

    pub fn with_names(mut self, first_name: impl Into<String>, last_name: impl Into<String>) -> Self {
        self.first_name = first_name.into();
        self.last_name = last_name.into();
        self
    }

    pub fn with_gender(mut self, gender: Gender) -> Self {
        self.gender = Some(gender);
        self
    }

    pub fn with_abstract(mut self, abstract_text: impl Into<String>) -> Self {
        self.abstract_text = Some(abstract_text.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Trims every field and checks the required ones.
    pub(crate) fn validated(mut self) -> Result<Self, PersonError> {
        self.first_name = self.first_name.trim().to_string();
        self.last_name = self.last_name.trim().to_string();
        self.public_name = self.public_name.trim().to_string();
        self.email = self.email.trim().to_string();
        self.abstract_text = non_blank(self.abstract_text);
        self.description = non_blank(self.description);

        if self.public_name.is_empty() {
            return Err(PersonError::PublicNameRequired);
        }
        if self.email.is_empty() {
            return Err(PersonError::EmailRequired);
        }
        Ok(self)
    }
}

fn non_blank(text: Option<String>) -> Option<String> {
    text.map(|t| t.trim().to_string()).filter(|t| !t.is_empty())
}

/// Sizes an avatar is rendered in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AvatarStyle {
    /// 16x16
    Tiny,
    /// 32x32
    Small,
    #[default]
    Medium,
    /// 128x128
    Large,
}

impl AvatarStyle {
    pub fn as_str(&self) -> &'static str {
        match self {
            AvatarStyle::Tiny => "tiny",
            AvatarStyle::Small => "small",
            AvatarStyle::Medium => "medium",
            AvatarStyle::Large => "large",
        }
    }
}

/// Reference to an uploaded avatar. The file itself lives elsewhere.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Avatar {
    pub file_name: String,
    pub content_type: String,
}

impl Avatar {
    const IMAGE_TYPES: [&'static str; 4] = ["jpg", "jpeg", "png", "gif"];

    /// Creates an avatar reference, rejecting anything that is not an image.
    pub fn new(
        file_name: impl Into<String>,
        content_type: impl Into<String>,
    ) -> Result<Self, PersonError> {
        let content_type = content_type.into();
        let lowered = content_type.to_lowercase();
        if !Self::IMAGE_TYPES.iter().any(|t| lowered.contains(t)) {
            return Err(PersonError::InvalidAvatarContentType(content_type));
        }
        Ok(Self {
            file_name: file_name.into(),
            content_type,
        })
    }

    /// URL path of the rendered style.
    pub fn path(&self, person_id: AggregateId, style: AvatarStyle) -> String {
        format!(
            "/system/people/avatars/{person_id}/{}/{}",
            style.as_str(),
            self.file_name
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ContactKind {
    Link { title: String },
    PhoneNumber { phone_type: String },
    ImAccount { im_type: String },
}

/// A link, phone number or IM account owned by a person.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    pub id: ContactId,
    pub kind: ContactKind,
    pub value: String,
}

impl Contact {
    pub fn new(kind: ContactKind, value: impl Into<String>) -> Self {
        Self {
            id: ContactId::new(),
            kind,
            value: value.into(),
        }
    }

    pub fn link(title: impl Into<String>, url: impl Into<String>) -> Self {
        Self::new(
            ContactKind::Link {
                title: title.into(),
            },
            url,
        )
    }

    pub fn phone(phone_type: impl Into<String>, number: impl Into<String>) -> Self {
        Self::new(
            ContactKind::PhoneNumber {
                phone_type: phone_type.into(),
            },
            number,
        )
    }

    pub fn im(im_type: impl Into<String>, account: impl Into<String>) -> Self {
        Self::new(
            ContactKind::ImAccount {
                im_type: im_type.into(),
            },
            account,
        )
    }
}
