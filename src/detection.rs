use crate::BoundingBox;
use uuid::Uuid;

/// Detection represents a bounding box detection in a single image.
#[derive(Debug, Clone)]
pub struct Detection {
    /// Unique detection identifier
    id: Uuid,
    /// Bounding box in top, left, width, height format.
    bbox: BoundingBox,
    /// Detection confidence score.
    confidence: f32,
    /// Optional class identifier.
    class_id: Option<usize>,
    /// Optional class name
    class_name: Option<String>,
}

impl Detection {
    /// Returns a new Detection
    ///
    /// # Parameters
    ///
    /// * `id`: An optional unique identifier. Generated if not supplied.
    /// * `bbox`: A bounding box object.
    /// * `confidence`: Detection confidence score.
    /// * `class_id`: An optional class identifier.
    /// * `class_name`: An optional class name.
    pub fn new(
        id: Option<Uuid>,
        bbox: BoundingBox,
        confidence: f32,
        class_id: Option<usize>,
        class_name: Option<String>,
    ) -> Detection {
        Detection {
            id: id.unwrap_or_else(Uuid::new_v4),
            bbox,
            confidence,
            class_id,
            class_name,
        }
    }

    /// Returns the unique id of the detection
    pub fn id(&self) -> &Uuid {
        &self.id
    }

    /// Returns a BoundingBox of the detection co-ordinates
    pub fn bbox(&self) -> &BoundingBox {
        &self.bbox
    }

    /// Returns the confidence of the detection
    pub fn confidence(&self) -> f32 {
        self.confidence
    }

    /// Returns the class identifier of the detection
    pub fn class_id(&self) -> Option<usize> {
        self.class_id
    }

    /// Returns the class name of the detection
    pub fn class_name(&self) -> &Option<String> {
        &self.class_name
    }

    /// Returns whether the detection is usable for matching: finite coordinates,
    /// positive width and height, and a confidence inside [0.0, 1.0].
    pub fn is_valid(&self) -> bool {
        self.bbox.x().is_finite()
            && self.bbox.y().is_finite()
            && self.bbox.width().is_finite()
            && self.bbox.height().is_finite()
            && self.bbox.width() > 0.0
            && self.bbox.height() > 0.0
            && self.confidence >= 0.0
            && self.confidence <= 1.0
    }
}
