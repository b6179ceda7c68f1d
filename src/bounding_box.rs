use ndarray::*;

/// BoundingBox represents an axis-aligned box in image space.
#[derive(Debug, Clone)]
pub struct BoundingBox {
    /// Left of the bounding box (i.e. min-x)
    x: f32,
    /// Top of the bounding box (i.e. min-y)
    y: f32,
    /// Width of the bounding box
    width: f32,
    /// Height of the bounding box
    height: f32,
}

impl PartialEq for BoundingBox {
    fn eq(&self, other: &Self) -> bool {
        self.x == other.x
            && self.y == other.y
            && self.width == other.width
            && self.height == other.height
    }
}

impl BoundingBox {
    /// Returns a new BoundingBox
    ///
    /// # Parameters
    ///
    /// * `x`: Bounding box left.
    /// * `y`: Bounding box top.
    /// * `width`: Bounding box width.
    /// * `height`: Bounding box height.
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> BoundingBox {
        BoundingBox {
            x,
            y,
            width,
            height,
        }
    }

    /// Returns a new BoundingBox from corner coordinates `(min x, min y, max x, max y)`.
    pub fn from_tlbr(x1: f32, y1: f32, x2: f32, y2: f32) -> BoundingBox {
        BoundingBox::new(x1, y1, x2 - x1, y2 - y1)
    }

    /// Returns a new BoundingBox from center x, center y, aspect ratio and height,
    /// where the aspect ratio is `width / height`.
    pub fn from_xyah(center_x: f32, center_y: f32, aspect_ratio: f32, height: f32) -> BoundingBox {
        let width = aspect_ratio * height;
        BoundingBox::new(center_x - (width / 2.0), center_y - (height / 2.0), width, height)
    }

    /// Returns the x of the bounding box
    pub fn x(&self) -> f32 {
        self.x
    }

    /// Returns the y of the bounding box
    pub fn y(&self) -> f32 {
        self.y
    }

    /// Returns the width of the bounding box
    pub fn width(&self) -> f32 {
        self.width
    }

    /// Returns the height of the bounding box
    pub fn height(&self) -> f32 {
        self.height
    }

    /// Returns the area of the bounding box
    pub fn area(&self) -> f32 {
        self.width * self.height
    }

    /// Returns the bounding box in top-left, bottom-right format, i.e., `(min x, min y, max x, max y)`.
    pub fn to_tlbr(&self) -> Array1<f32> {
        arr1::<f32>(&[self.x, self.y, self.x + self.width, self.y + self.height])
    }

    /// Returns the bounding box in center x, center y, aspect ratio, height format, where the aspect ratio is `width / height`.
    pub fn to_xyah(&self) -> Array1<f32> {
        arr1::<f32>(&[
            self.x + (self.width / 2.0),
            self.y + (self.height / 2.0),
            self.width / self.height,
            self.height,
        ])
    }

    /// Returns a copy of the bounding box clamped to the pixel bounds of `frame`.
    pub fn clip(&self, frame: &FrameSize) -> BoundingBox {
        let x1 = self.x.clamp(0.0, frame.width());
        let y1 = self.y.clamp(0.0, frame.height());
        let x2 = (self.x + self.width).clamp(0.0, frame.width());
        let y2 = (self.y + self.height).clamp(0.0, frame.height());
        BoundingBox::from_tlbr(x1, y1, x2, y2)
    }

    /// Compute intersection over union against `other`.
    ///
    /// # Returns
    ///
    /// The intersection over union in [0.0, 1.0]. Boxes that do not overlap, and
    /// boxes with non-positive area, score 0.0.
    pub fn iou(&self, other: &BoundingBox) -> f32 {
        if self.area() <= 0.0 || other.area() <= 0.0 {
            return 0.0;
        }

        let intersection_x1 = self.x.max(other.x);
        let intersection_y1 = self.y.max(other.y);
        let intersection_x2 = (self.x + self.width).min(other.x + other.width);
        let intersection_y2 = (self.y + self.height).min(other.y + other.height);

        let intersection_width = (intersection_x2 - intersection_x1).max(0.0);
        let intersection_height = (intersection_y2 - intersection_y1).max(0.0);
        let intersection_area = intersection_width * intersection_height;

        let union_area = self.area() + other.area() - intersection_area;
        if union_area <= 0.0 {
            return 0.0;
        }

        intersection_area / union_area
    }
}

/// FrameSize is the pixel extent of the source frame, used to clip predicted
/// and reported boxes to valid image bounds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameSize {
    width: f32,
    height: f32,
}

impl FrameSize {
    /// Returns a new FrameSize
    ///
    /// # Parameters
    ///
    /// * `width`: Frame width in pixels.
    /// * `height`: Frame height in pixels.
    pub fn new(width: f32, height: f32) -> FrameSize {
        FrameSize { width, height }
    }

    /// Returns the width of the frame
    pub fn width(&self) -> f32 {
        self.width
    }

    /// Returns the height of the frame
    pub fn height(&self) -> f32 {
        self.height
    }
}

#[cfg(test)]
mod tests {
    use crate::*;
    use assert_approx_eq::assert_approx_eq;
    use ndarray::*;

    #[test]
    fn to_tlbr() {
        let bbox = BoundingBox::new(1.0, 2.0, 13.0, 4.0);
        assert_eq!(bbox.to_tlbr(), arr1::<f32>(&[1.0, 2.0, 14.0, 6.0]));
    }

    #[test]
    fn to_xyah() {
        let bbox = BoundingBox::new(1.0, 2.0, 13.0, 4.0);
        assert_eq!(bbox.to_xyah(), arr1::<f32>(&[7.5, 4.0, 3.25, 4.0]));
    }

    #[test]
    fn from_tlbr() {
        let bbox = BoundingBox::from_tlbr(1.0, 2.0, 14.0, 6.0);
        assert_eq!(bbox, BoundingBox::new(1.0, 2.0, 13.0, 4.0));
    }

    #[test]
    fn from_xyah() {
        let bbox = BoundingBox::from_xyah(7.5, 4.0, 3.25, 4.0);
        assert_eq!(bbox, BoundingBox::new(1.0, 2.0, 13.0, 4.0));
    }

    #[test]
    fn clip_inside_is_identity() {
        let frame = FrameSize::new(640.0, 480.0);
        let bbox = BoundingBox::new(10.0, 20.0, 30.0, 40.0);
        assert_eq!(bbox.clip(&frame), bbox);
    }

    #[test]
    fn clip_clamps_to_frame() {
        let frame = FrameSize::new(640.0, 480.0);

        let bbox = BoundingBox::from_tlbr(-5.0, -3.0, 20.0, 15.0).clip(&frame);
        assert_eq!(bbox, BoundingBox::from_tlbr(0.0, 0.0, 20.0, 15.0));

        let bbox = BoundingBox::from_tlbr(630.0, 470.0, 650.0, 490.0).clip(&frame);
        assert_eq!(bbox, BoundingBox::from_tlbr(630.0, 470.0, 640.0, 480.0));
    }

    #[test]
    fn clip_fully_outside_degenerates() {
        let frame = FrameSize::new(640.0, 480.0);
        let bbox = BoundingBox::from_tlbr(700.0, 500.0, 720.0, 520.0).clip(&frame);
        assert_eq!(bbox.area(), 0.0);
    }

    #[test]
    fn iou_identical() {
        let a = BoundingBox::new(0.0, 0.0, 5.0, 5.0);
        assert_approx_eq!(a.iou(&a), 1.0);
    }

    #[test]
    fn iou_disjoint() {
        let a = BoundingBox::new(0.0, 0.0, 5.0, 5.0);
        let b = BoundingBox::new(10.0, 10.0, 5.0, 5.0);
        assert_eq!(a.iou(&b), 0.0);
    }

    #[test]
    fn iou_partial_overlap() {
        let a = BoundingBox::from_tlbr(0.0, 0.0, 10.0, 10.0);
        let b = BoundingBox::from_tlbr(5.0, 5.0, 15.0, 15.0);
        // intersection 25, union 175
        assert_approx_eq!(a.iou(&b), 1.0 / 7.0);
    }

    #[test]
    fn iou_is_symmetric() {
        let a = BoundingBox::from_tlbr(0.0, 0.0, 10.0, 10.0);
        let b = BoundingBox::from_tlbr(3.0, 4.0, 12.0, 11.0);
        assert_eq!(a.iou(&b), b.iou(&a));
    }

    #[test]
    fn iou_degenerate_area_is_zero() {
        let a = BoundingBox::new(0.0, 0.0, 0.0, 5.0);
        let b = BoundingBox::new(0.0, 0.0, 5.0, 5.0);
        assert_eq!(a.iou(&b), 0.0);
        assert_eq!(b.iou(&a), 0.0);
    }

    #[test]
    fn iou_scale_invariant() {
        let a = BoundingBox::from_tlbr(0.0, 0.0, 10.0, 10.0);
        let b = BoundingBox::from_tlbr(5.0, 5.0, 15.0, 15.0);
        let a_scaled = BoundingBox::from_tlbr(0.0, 0.0, 100.0, 100.0);
        let b_scaled = BoundingBox::from_tlbr(50.0, 50.0, 150.0, 150.0);
        assert_approx_eq!(a.iou(&b), a_scaled.iou(&b_scaled), 1e-6);
    }
}
