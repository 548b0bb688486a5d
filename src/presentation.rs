//! Presentation document model.
//!
//! A [`Presentation`] is an ordered list of [`Slide`]s plus document-level
//! design tokens. Each slide holds an ordered list of [`SlideElement`]s whose
//! order is also their z-order (last element draws on top).
//!
//! The JSON shape (camelCase, `"type"`-tagged variants) is the one stored in the
//! document store, so these types are serialized as-is when persisting.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::ids::{ElementId, IdGenerator, SlideId};

/// A position on the slide, in document units
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Position moved by a delta
    pub fn translated(self, dx: f64, dy: f64) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }
}

/// Element size, in document units
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

impl Default for Size {
    fn default() -> Self {
        Self::new(200.0, 100.0)
    }
}

/// Document-level design tokens
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DesignSystem {
    pub primary: String,
    pub secondary: String,
    pub accent: String,
    pub background: String,
    pub text: String,
    pub heading_font: String,
    pub body_font: String,
}

impl Default for DesignSystem {
    fn default() -> Self {
        Self {
            primary: "#1a1a2e".to_string(),
            secondary: "#16213e".to_string(),
            accent: "#e94560".to_string(),
            background: "#ffffff".to_string(),
            text: "#222222".to_string(),
            heading_font: "Inter".to_string(),
            body_font: "Inter".to_string(),
        }
    }
}

/// Slide background
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Background {
    Color {
        color: String,
    },
    Image {
        url: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        overlay: Option<String>,
    },
    Gradient {
        from: String,
        to: String,
        #[serde(default)]
        angle: f64,
    },
}

impl Default for Background {
    fn default() -> Self {
        Background::Color {
            color: "#ffffff".to_string(),
        }
    }
}

/// Horizontal text alignment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TextAlign {
    #[default]
    Left,
    Center,
    Right,
}

/// Styling for text elements
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TextStyle {
    pub font_size: f64,
    pub font_weight: u16,
    pub color: String,
    pub align: TextAlign,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_family: Option<String>,
}

impl Default for TextStyle {
    fn default() -> Self {
        Self {
            font_size: 24.0,
            font_weight: 400,
            color: "#222222".to_string(),
            align: TextAlign::default(),
            font_family: None,
        }
    }
}

/// How an image fills its frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ImageFit {
    #[default]
    Cover,
    Contain,
    Fill,
}

/// Geometric primitive for shape elements
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ShapeKind {
    #[default]
    Rectangle,
    RoundedRect,
    Ellipse,
    Triangle,
    Line,
}

/// Kind-specific content of an element
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ElementKind {
    Text {
        text: String,
        #[serde(default)]
        style: TextStyle,
    },
    Image {
        src: String,
        #[serde(default)]
        alt: String,
        #[serde(default)]
        fit: ImageFit,
    },
    #[serde(rename_all = "camelCase")]
    Shape {
        #[serde(default)]
        shape: ShapeKind,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        fill: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        stroke: Option<String>,
        #[serde(default)]
        stroke_width: f64,
    },
    Metric {
        value: String,
        label: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        color: Option<String>,
    },
}

impl ElementKind {
    /// Get display name for this kind
    pub fn name(&self) -> &'static str {
        match self {
            ElementKind::Text { .. } => "Text",
            ElementKind::Image { .. } => "Image",
            ElementKind::Shape { .. } => "Shape",
            ElementKind::Metric { .. } => "Metric",
        }
    }
}

/// A positioned content unit on a slide
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlideElement {
    pub id: ElementId,
    #[serde(flatten)]
    pub position: Position,
    #[serde(flatten)]
    pub size: Size,
    #[serde(default)]
    pub rotation: f64,
    #[serde(flatten)]
    pub kind: ElementKind,
}

impl SlideElement {
    pub fn new(id: impl Into<ElementId>, position: Position, size: Size, kind: ElementKind) -> Self {
        Self {
            id: id.into(),
            position,
            size,
            rotation: 0.0,
            kind,
        }
    }

    /// Merge partial changes into this element.
    ///
    /// The patch is laid over the element's JSON form, so it uses the same keys
    /// (`x`, `width`, `text`, `style.fontSize`, ...). Returns whether anything
    /// changed. A patch that does not produce a valid element is an error and
    /// leaves the element as it was.
    pub fn apply_patch(&mut self, patch: &ElementPatch) -> Result<bool, serde_json::Error> {
        let mut value = serde_json::to_value(&*self)?;
        if let Value::Object(fields) = &mut value {
            for (key, change) in patch.0.iter().filter(|(key, _)| key.as_str() != "id") {
                merge(fields.entry(key.clone()).or_insert(Value::Null), change);
            }
        }

        let merged: SlideElement = serde_json::from_value(value)?;
        if merged == *self {
            return Ok(false);
        }
        *self = merged;
        Ok(true)
    }
}

/// Recursive object merge; anything that is not an object pair is replaced
fn merge(target: &mut Value, change: &Value) {
    match (target, change) {
        (Value::Object(target), Value::Object(change)) => {
            for (key, value) in change {
                merge(target.entry(key.clone()).or_insert(Value::Null), value);
            }
        }
        (target, change) => *target = change.clone(),
    }
}

/// Partial changes for an element, in the element's own flat JSON shape.
///
/// `{"x": 30}` moves only the x coordinate, `{"style": {"fontSize": 40}}`
/// touches a single style field, `{"type": "shape"}` swaps the kind. The id is
/// not patchable and is ignored if present.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ElementPatch(Map<String, Value>);

impl ElementPatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style field change
    pub fn set(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.0.insert(key.to_string(), value.into());
        self
    }

    pub fn position(x: f64, y: f64) -> Self {
        Self::new().set("x", x).set("y", y)
    }

    pub fn size(width: f64, height: f64) -> Self {
        Self::new().set("width", width).set("height", height)
    }

    pub fn text(text: impl Into<String>) -> Self {
        Self::new().set("text", text.into())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// One page of a presentation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Slide {
    pub id: SlideId,
    #[serde(default)]
    pub elements: Vec<SlideElement>,
    #[serde(default)]
    pub background: Background,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl Slide {
    pub fn new(id: impl Into<SlideId>) -> Self {
        Self {
            id: id.into(),
            elements: Vec::new(),
            background: Background::default(),
            notes: None,
        }
    }

    /// Builder-style element append
    pub fn with_element(mut self, element: SlideElement) -> Self {
        self.elements.push(element);
        self
    }

    pub fn element(&self, id: &ElementId) -> Option<&SlideElement> {
        self.elements.iter().find(|e| &e.id == id)
    }

    pub fn element_index(&self, id: &ElementId) -> Option<usize> {
        self.elements.iter().position(|e| &e.id == id)
    }

    pub fn contains_element(&self, id: &ElementId) -> bool {
        self.element_index(id).is_some()
    }

    /// Give every element that repeats an earlier id a fresh one
    fn dedupe_element_ids(&mut self, taken: &mut HashSet<String>, ids: &mut IdGenerator) {
        let mut seen = HashSet::new();
        for element in &mut self.elements {
            if !seen.insert(element.id.0.clone()) {
                element.id = ids.next_element_id(taken);
                seen.insert(element.id.0.clone());
            }
            taken.insert(element.id.0.clone());
        }
    }
}

/// The full multi-slide document being edited
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Presentation {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub slides: Vec<Slide>,
    #[serde(default)]
    pub design_system: DesignSystem,
}

impl Presentation {
    /// A presentation with a single empty slide
    pub fn blank(ids: &mut IdGenerator) -> Self {
        Self {
            title: String::new(),
            slides: vec![Slide::new(ids.next_slide_id(&HashSet::new()))],
            design_system: DesignSystem::default(),
        }
    }

    pub fn slide(&self, index: usize) -> Option<&Slide> {
        self.slides.get(index)
    }

    pub fn slide_count(&self) -> usize {
        self.slides.len()
    }

    /// Every slide and element id in the document
    pub fn all_ids(&self) -> HashSet<String> {
        let mut ids = HashSet::new();
        for slide in &self.slides {
            ids.insert(slide.id.0.clone());
            for element in &slide.elements {
                ids.insert(element.id.0.clone());
            }
        }
        ids
    }

    /// Bring an externally produced document in line with the editor's
    /// structural invariants: at least one slide, unique slide ids, and unique
    /// element ids within each slide.
    pub fn normalize(&mut self, ids: &mut IdGenerator) {
        let mut taken = self.all_ids();
        if self.slides.is_empty() {
            self.slides.push(Slide::new(ids.next_slide_id(&taken)));
        }

        let mut seen = HashSet::new();
        for slide in &mut self.slides {
            if !seen.insert(slide.id.0.clone()) {
                slide.id = ids.next_slide_id(&taken);
                seen.insert(slide.id.0.clone());
                taken.insert(slide.id.0.clone());
            }
            slide.dedupe_element_ids(&mut taken, ids);
        }
    }

    /// Normalise an incoming slide against this document: fresh slide id if it
    /// collides with an existing slide, unique element ids within the slide.
    pub fn adopt_slide(&self, mut slide: Slide, ids: &mut IdGenerator) -> Slide {
        let mut taken = self.all_ids();
        if self.slides.iter().any(|s| s.id == slide.id) {
            slide.id = ids.next_slide_id(&taken);
            taken.insert(slide.id.0.clone());
        }
        slide.dedupe_element_ids(&mut taken, ids);
        slide
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(id: &str, x: f64, y: f64) -> SlideElement {
        SlideElement::new(
            id,
            Position::new(x, y),
            Size::default(),
            ElementKind::Text {
                text: "hello".to_string(),
                style: TextStyle::default(),
            },
        )
    }

    #[test]
    fn element_json_is_flat_and_tagged() {
        let json = serde_json::to_value(text("e1", 10.0, 10.0)).unwrap();
        assert_eq!(json["id"], "e1");
        assert_eq!(json["x"], 10.0);
        assert_eq!(json["y"], 10.0);
        assert_eq!(json["type"], "text");
        assert_eq!(json["text"], "hello");
    }

    #[test]
    fn parses_producer_slide() {
        let slide: Slide = serde_json::from_str(
            r##"{
                "id": "s1",
                "background": {"type": "gradient", "from": "#000", "to": "#fff", "angle": 45},
                "elements": [
                    {"id": "m1", "x": 40, "y": 60, "width": 300, "height": 120,
                     "type": "metric", "value": "42%", "label": "Growth"},
                    {"id": "img", "x": 0, "y": 0, "width": 10, "height": 10,
                     "type": "image", "src": "https://cdn/x.png"}
                ]
            }"##,
        )
        .unwrap();

        assert_eq!(slide.elements.len(), 2);
        assert_eq!(slide.elements[0].kind.name(), "Metric");
        assert_eq!(slide.elements[1].rotation, 0.0);
        assert!(matches!(slide.background, Background::Gradient { angle, .. } if angle == 45.0));
    }

    #[test]
    fn patch_merges_only_given_fields() {
        let mut element = text("e1", 10.0, 10.0);
        assert!(element.apply_patch(&ElementPatch::text("bye")).unwrap());
        assert_eq!(element.position, Position::new(10.0, 10.0));
        assert!(matches!(&element.kind, ElementKind::Text { text, .. } if text == "bye"));

        assert!(!element.apply_patch(&ElementPatch::default()).unwrap());
    }

    #[test]
    fn single_coordinate_patch_from_json() {
        let mut element = text("e1", 10.0, 10.0);
        let patch: ElementPatch = serde_json::from_str(r#"{"x": 30}"#).unwrap();

        assert!(element.apply_patch(&patch).unwrap());
        assert_eq!(element.position, Position::new(30.0, 10.0));
        assert_eq!(element.size, Size::default());
    }

    #[test]
    fn nested_style_patch_keeps_other_style_fields() {
        let mut element = text("e1", 0.0, 0.0);
        let patch: ElementPatch = serde_json::from_str(r#"{"style": {"fontSize": 40}}"#).unwrap();

        assert!(element.apply_patch(&patch).unwrap());
        match &element.kind {
            ElementKind::Text { text, style } => {
                assert_eq!(text, "hello");
                assert_eq!(style.font_size, 40.0);
                assert_eq!(style.color, TextStyle::default().color);
            }
            other => panic!("unexpected kind {:?}", other),
        }
    }

    #[test]
    fn metric_fields_and_id_guard() {
        let mut element = SlideElement::new(
            "m1",
            Position::default(),
            Size::default(),
            ElementKind::Metric {
                value: "1".to_string(),
                label: "Users".to_string(),
                color: None,
            },
        );
        let patch = ElementPatch::new().set("value", "2").set("id", "hijack");

        assert!(element.apply_patch(&patch).unwrap());
        assert_eq!(element.id, ElementId::from("m1"));
        assert!(matches!(&element.kind, ElementKind::Metric { value, label, .. } if value == "2" && label == "Users"));
    }

    #[test]
    fn ill_typed_patch_is_rejected() {
        let mut element = text("e1", 10.0, 10.0);
        let before = element.clone();

        assert!(element.apply_patch(&ElementPatch::new().set("x", "left")).is_err());
        assert_eq!(element, before);
    }

    #[test]
    fn text_patch_ignored_for_images() {
        let mut element = SlideElement::new(
            "i1",
            Position::default(),
            Size::default(),
            ElementKind::Image {
                src: "a.png".to_string(),
                alt: String::new(),
                fit: ImageFit::Cover,
            },
        );
        assert!(!element.apply_patch(&ElementPatch::text("nope")).unwrap());
    }

    #[test]
    fn normalize_fixes_empty_and_duplicate_ids() {
        let mut ids = IdGenerator::with_namespace("t");
        let mut empty = Presentation {
            title: String::new(),
            slides: Vec::new(),
            design_system: DesignSystem::default(),
        };
        empty.normalize(&mut ids);
        assert_eq!(empty.slide_count(), 1);

        let slide = Slide::new("s")
            .with_element(text("e", 0.0, 0.0))
            .with_element(text("e", 1.0, 1.0));
        let mut doc = Presentation {
            title: String::new(),
            slides: vec![slide.clone(), slide],
            design_system: DesignSystem::default(),
        };
        doc.normalize(&mut ids);

        assert_ne!(doc.slides[0].id, doc.slides[1].id);
        for slide in &doc.slides {
            assert_ne!(slide.elements[0].id, slide.elements[1].id);
        }
    }
}
