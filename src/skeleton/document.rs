//! Serde model of the Spine JSON skeleton document. Only the parts the viewer
//! poses and draws are kept; everything else is ignored while parsing.

use std::fmt;
use std::marker::PhantomData;

use serde::de::{Deserializer, MapAccess, Visitor};
use serde::Deserialize;

/// JSON object whose key order is significant (animations, skins, slots).
#[derive(Debug, Clone, PartialEq)]
pub struct NamedList<T>(pub Vec<(String, T)>);

impl<T> Default for NamedList<T> {
    fn default() -> Self {
        Self(Vec::new())
    }
}

impl<T> NamedList<T> {
    pub fn iter(&self) -> impl Iterator<Item = (&str, &T)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for NamedList<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct NamedListVisitor<T>(PhantomData<T>);

        impl<'de, T: Deserialize<'de>> Visitor<'de> for NamedListVisitor<T> {
            type Value = NamedList<T>;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of named entries")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
                let mut entries = Vec::with_capacity(map.size_hint().unwrap_or(0));
                while let Some((key, value)) = map.next_entry::<String, T>()? {
                    entries.push((key, value));
                }
                Ok(NamedList(entries))
            }
        }

        deserializer.deserialize_map(NamedListVisitor(PhantomData))
    }
}

fn one() -> f32 {
    1.0
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoneDoc {
    pub name: String,
    #[serde(default)]
    pub parent: Option<String>,
    #[serde(default)]
    pub x: f32,
    #[serde(default)]
    pub y: f32,
    #[serde(default)]
    pub rotation: f32,
    #[serde(default = "one")]
    pub scale_x: f32,
    #[serde(default = "one")]
    pub scale_y: f32,
    #[serde(default)]
    pub shear_x: f32,
    #[serde(default)]
    pub shear_y: f32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SlotDoc {
    pub name: String,
    pub bone: String,
    #[serde(default)]
    pub attachment: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttachmentDoc {
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub x: f32,
    #[serde(default)]
    pub y: f32,
    #[serde(default)]
    pub rotation: f32,
    #[serde(default = "one")]
    pub scale_x: f32,
    #[serde(default = "one")]
    pub scale_y: f32,
    #[serde(default)]
    pub width: f32,
    #[serde(default)]
    pub height: f32,
    #[serde(default)]
    pub uvs: Vec<f32>,
    #[serde(default)]
    pub triangles: Vec<u32>,
    #[serde(default)]
    pub vertices: Vec<f32>,
}

/// slot name -> attachment name -> attachment
pub type SkinAttachments = NamedList<NamedList<AttachmentDoc>>;

#[derive(Debug, Clone, Deserialize)]
pub struct SkinDoc {
    pub name: String,
    #[serde(default)]
    pub attachments: SkinAttachments,
}

/// 3.8+ exports skins as an array, older exports as an object keyed by name.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum SkinsDoc {
    List(Vec<SkinDoc>),
    Legacy(NamedList<SkinAttachments>),
}

impl Default for SkinsDoc {
    fn default() -> Self {
        SkinsDoc::List(Vec::new())
    }
}

impl SkinsDoc {
    pub fn into_skins(self) -> Vec<SkinDoc> {
        match self {
            SkinsDoc::List(skins) => skins,
            SkinsDoc::Legacy(map) => map
                .0
                .into_iter()
                .map(|(name, attachments)| SkinDoc { name, attachments })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RotateKeyDoc {
    #[serde(default)]
    pub time: f32,
    #[serde(default, alias = "angle")]
    pub value: f32,
    #[serde(default)]
    pub curve: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VectorKeyDoc {
    #[serde(default)]
    pub time: f32,
    #[serde(default)]
    pub x: Option<f32>,
    #[serde(default)]
    pub y: Option<f32>,
    #[serde(default)]
    pub curve: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct BoneTimelinesDoc {
    #[serde(default)]
    pub rotate: Vec<RotateKeyDoc>,
    #[serde(default)]
    pub translate: Vec<VectorKeyDoc>,
    #[serde(default)]
    pub scale: Vec<VectorKeyDoc>,
    #[serde(default)]
    pub shear: Vec<VectorKeyDoc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AttachmentKeyDoc {
    #[serde(default)]
    pub time: f32,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SlotTimelinesDoc {
    #[serde(default)]
    pub attachment: Vec<AttachmentKeyDoc>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AnimationDoc {
    #[serde(default)]
    pub bones: NamedList<BoneTimelinesDoc>,
    #[serde(default)]
    pub slots: NamedList<SlotTimelinesDoc>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SkeletonDocument {
    #[serde(default)]
    pub bones: Vec<BoneDoc>,
    #[serde(default)]
    pub slots: Vec<SlotDoc>,
    #[serde(default)]
    pub skins: SkinsDoc,
    #[serde(default)]
    pub animations: NamedList<AnimationDoc>,
}

impl SkeletonDocument {
    pub fn parse(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}

/// `"stepped"` holds the key value until the next key; anything else is sampled linearly.
pub fn is_stepped(curve: &Option<serde_json::Value>) -> bool {
    matches!(curve, Some(serde_json::Value::String(s)) if s == "stepped")
}
