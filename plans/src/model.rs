//! Floor-plan data model: PDF cards, their extracted plan pages, and pins.
//!
//! A [`FloorPlanCard`] is one uploaded PDF. Its [`Plan`]s are the page images
//! extracted from it, immutable once stored, each with its native pixel size.
//! A [`Pin`] marks a point on one plan in normalized `[0, 1]` coordinates and
//! may link to one report item (a "card" in the report tray).
//!
//! Everything here serializes to the camelCase JSON the app persists.

#[cfg(test)]
#[path = "model_test.rs"]
mod model_test;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use canvas::coords::{Point, Size};

/// Identifier of a floor-plan card.
pub type FloorPlanId = Uuid;

/// Identifier of a plan page.
pub type PlanId = Uuid;

/// Identifier of a pin.
pub type PinId = Uuid;

/// Identifier of a report item card. Owned by the report, opaque here.
pub type CardId = String;

/// Encoded images longer than this are kept behind a session handle.
pub const LARGE_IMAGE_CHARS: usize = 50_000;

/// Where the PDF came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PdfSource {
    #[default]
    Gallery,
    Sharepoint,
}

/// Image data of a plan page.
///
/// Large pages are displayed through an ephemeral handle (an object URL)
/// that only lives for the session; a compressed durable copy is what
/// survives a reload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanImage {
    #[serde(skip)]
    pub ephemeral_handle: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub durable_src: Option<String>,
}

impl PlanImage {
    /// An image stored inline.
    #[must_use]
    pub fn inline(src: impl Into<String>) -> Self {
        Self { ephemeral_handle: None, durable_src: Some(src.into()) }
    }

    /// A session handle backed by a compressed fallback.
    #[must_use]
    pub fn with_handle(handle: impl Into<String>, fallback: impl Into<String>) -> Self {
        Self { ephemeral_handle: Some(handle.into()), durable_src: Some(fallback.into()) }
    }

    /// Whether an encoded image is large enough to warrant a session handle.
    #[must_use]
    pub fn is_large(encoded: &str) -> bool {
        encoded.starts_with("data:") && encoded.len() > LARGE_IMAGE_CHARS
    }

    /// The source to display: the session handle when present, else the durable copy.
    #[must_use]
    pub fn best_source(&self) -> Option<&str> {
        self.ephemeral_handle.as_deref().or(self.durable_src.as_deref())
    }
}

/// One extracted page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Plan {
    pub id: PlanId,
    #[serde(rename = "floorPlanCardId")]
    pub card_id: FloorPlanId,
    /// Native pixel size of the page image.
    pub width: f64,
    pub height: f64,
    /// Zero-based page in the source PDF.
    pub page_index: u32,
    #[serde(default)]
    pub name: String,
    #[serde(flatten)]
    pub image: PlanImage,
}

impl Plan {
    #[must_use]
    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }
}

/// One uploaded PDF with its plan pages, in page order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FloorPlanCard {
    pub id: FloorPlanId,
    pub report_id: String,
    pub filename: String,
    #[serde(default, rename = "pdfSource")]
    pub source: PdfSource,
    #[serde(default)]
    pub plans: Vec<Plan>,
    pub created_at: f64,
    pub updated_at: f64,
}

impl FloorPlanCard {
    #[must_use]
    pub fn new(report_id: impl Into<String>, filename: impl Into<String>, source: PdfSource, now_ms: f64) -> Self {
        Self {
            id: Uuid::new_v4(),
            report_id: report_id.into(),
            filename: filename.into(),
            source,
            plans: Vec::new(),
            created_at: now_ms,
            updated_at: now_ms,
        }
    }

    /// Append an extracted page; returns its id.
    pub fn add_plan(
        &mut self,
        size: Size,
        page_index: u32,
        name: impl Into<String>,
        image: PlanImage,
        now_ms: f64,
    ) -> PlanId {
        let plan = Plan {
            id: Uuid::new_v4(),
            card_id: self.id,
            width: size.width,
            height: size.height,
            page_index,
            name: name.into(),
            image,
        };
        let id = plan.id;
        self.plans.push(plan);
        self.updated_at = now_ms;
        id
    }

    #[must_use]
    pub fn plan(&self, id: &PlanId) -> Option<&Plan> {
        self.plans.iter().find(|p| p.id == *id)
    }
}

/// A marker on a plan page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pin {
    pub id: PinId,
    pub report_id: String,
    #[serde(rename = "floorPlanCardId")]
    pub card_id: FloorPlanId,
    pub plan_id: PlanId,
    /// Normalized to the plan's native size.
    pub x: f64,
    pub y: f64,
    pub head_color: String,
    #[serde(default)]
    pub linked_card_id: Option<CardId>,
    pub created_at: f64,
}

impl Pin {
    #[must_use]
    pub fn position(&self) -> Point {
        Point::new(self.x, self.y)
    }

    #[must_use]
    pub fn is_linked(&self) -> bool {
        self.linked_card_id.is_some()
    }
}
