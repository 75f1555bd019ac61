mod path;

pub use path::{contour_intersects_rect, point_in_contour};

use std::collections::BTreeMap;

use egui::{Color32, Pos2, Rect, Vec2};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::geometry::bezier::{self, CURVE_STEPS};
use crate::geometry::rotate_about;

/// What an annotated region means to the rest of the pipeline.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShapeKind {
    /// Cradle member outline fed to detection.
    Input,
    /// Graded region produced by removal; carries tone attributes.
    Output,
    /// Defect mask region edited as a closed Bezier.
    Mask,
}

/// How the closed contour between knots is interpreted.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Topology {
    Polygon,
    ClosedBezier,
}

/// Which part of a control point a pointer interaction grabbed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Handle {
    Knot,
    TangentIn,
    TangentOut,
}

/// Numeric or boolean shape attribute.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttrValue {
    Bool(bool),
    Number(f64),
}

impl AttrValue {
    pub fn as_f64(&self) -> f64 {
        match self {
            AttrValue::Number(n) => *n,
            AttrValue::Bool(b) => {
                if *b {
                    1.0
                } else {
                    0.0
                }
            }
        }
    }

    pub fn as_bool(&self) -> bool {
        match self {
            AttrValue::Bool(b) => *b,
            AttrValue::Number(n) => *n != 0.0,
        }
    }
}

impl From<f64> for AttrValue {
    fn from(n: f64) -> Self {
        AttrValue::Number(n)
    }
}

impl From<bool> for AttrValue {
    fn from(b: bool) -> Self {
        AttrValue::Bool(b)
    }
}

/// One point of a shape contour: the knot plus incoming/outgoing Bezier
/// tangents stored as offsets relative to the knot.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ControlPoint {
    pub knot: Pos2,
    pub tan_in: Vec2,
    pub tan_out: Vec2,
}

impl ControlPoint {
    pub fn new(knot: Pos2) -> Self {
        Self {
            knot,
            tan_in: Vec2::ZERO,
            tan_out: Vec2::ZERO,
        }
    }

    pub fn with_tangents(knot: Pos2, tan_in: Vec2, tan_out: Vec2) -> Self {
        Self {
            knot,
            tan_in,
            tan_out,
        }
    }

    /// A smooth knot carries no tangent handles at all.
    pub fn is_smooth_knot(&self) -> bool {
        self.tan_in == Vec2::ZERO && self.tan_out == Vec2::ZERO
    }
}

// Points persist as compact comma strings: "x,y" for bare knots,
// "x,y,ix,iy,ox,oy" when tangents are present.
impl Serialize for ControlPoint {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let text = if self.is_smooth_knot() {
            format!("{},{}", self.knot.x, self.knot.y)
        } else {
            format!(
                "{},{},{},{},{},{}",
                self.knot.x, self.knot.y, self.tan_in.x, self.tan_in.y, self.tan_out.x, self.tan_out.y
            )
        };
        serializer.serialize_str(&text)
    }
}

impl<'de> Deserialize<'de> for ControlPoint {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        let parts: Vec<f32> = text
            .split(',')
            .map(|s| s.trim().parse::<f32>())
            .collect::<Result<_, _>>()
            .map_err(|e| D::Error::custom(format!("bad point component: {e}")))?;
        match parts.as_slice() {
            [x, y] => Ok(ControlPoint::new(Pos2::new(*x, *y))),
            [x, y, ix, iy, ox, oy] => Ok(ControlPoint::with_tangents(
                Pos2::new(*x, *y),
                Vec2::new(*ix, *iy),
                Vec2::new(*ox, *oy),
            )),
            _ => Err(D::Error::custom(format!(
                "expected 2 or 6 point components, got {}",
                parts.len()
            ))),
        }
    }
}

/// A closed annotated region: an ordered control point list, a kind fixed at
/// creation, a selection flag, an optional override color, and a string-keyed
/// attribute map. The contour implicitly connects the last knot back to the
/// first.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Shape {
    #[serde(rename = "type")]
    kind: ShapeKind,
    points: Vec<ControlPoint>,
    values: BTreeMap<String, AttrValue>,
    #[serde(skip)]
    selected: bool,
    #[serde(skip)]
    color: Option<Color32>,
}

impl Shape {
    pub fn new(kind: ShapeKind) -> Self {
        let mut shape = Self {
            kind,
            points: Vec::new(),
            values: BTreeMap::new(),
            selected: false,
            color: None,
        };
        shape.set_defaults();
        shape
    }

    /// New shape from an axis-aligned rectangle, corner knots in clockwise
    /// order starting top-left.
    pub fn from_rect(kind: ShapeKind, rect: Rect) -> Self {
        let mut shape = Self::new(kind);
        shape.set_rect(rect);
        shape
    }

    fn set_defaults(&mut self) {
        self.values.insert("black".into(), AttrValue::Number(0.0));
        self.values.insert("gamma".into(), AttrValue::Number(0.0));
        self.values.insert("white".into(), AttrValue::Number(255.0));
    }

    pub fn kind(&self) -> ShapeKind {
        self.kind
    }

    pub fn topology(&self) -> Topology {
        if self.kind == ShapeKind::Mask {
            Topology::ClosedBezier
        } else {
            Topology::Polygon
        }
    }

    pub fn is_selected(&self) -> bool {
        self.selected
    }

    pub(crate) fn set_selected(&mut self, state: bool) -> bool {
        if state != self.selected {
            self.selected = state;
            true
        } else {
            false
        }
    }

    pub fn color(&self) -> Color32 {
        self.color.unwrap_or(match self.kind {
            ShapeKind::Mask => Color32::RED,
            _ => Color32::BLUE,
        })
    }

    pub fn set_color(&mut self, color: Option<Color32>) {
        self.color = color;
    }

    // --- points -----------------------------------------------------------

    pub fn points(&self) -> &[ControlPoint] {
        &self.points
    }

    pub fn point(&self, index: usize) -> ControlPoint {
        self.points[index]
    }

    pub fn set_points(&mut self, points: Vec<ControlPoint>) {
        self.points = points;
    }

    pub fn set_point(&mut self, index: usize, point: ControlPoint) {
        self.points[index] = point;
    }

    pub fn set_rect(&mut self, rect: Rect) {
        self.points = vec![
            ControlPoint::new(rect.left_top()),
            ControlPoint::new(rect.right_top()),
            ControlPoint::new(rect.right_bottom()),
            ControlPoint::new(rect.left_bottom()),
        ];
    }

    pub fn delete_point(&mut self, index: usize) {
        self.points.remove(index);
    }

    /// Split the contour at curve parameter `t` (integer part = segment,
    /// fraction = position along it) and insert the split point, adjusting
    /// the neighbors' tangents so the drawn curve is unchanged. Returns the
    /// inserted index.
    pub fn insert_point(&mut self, t: f32) -> usize {
        let n = self.points.len();
        let segment = t.floor() as usize;
        assert!(segment < n, "insert_point: parameter {t} out of range");
        let s = t - segment as f32;
        let next_index = if segment == n - 1 { 0 } else { segment + 1 };

        let prev = self.points[segment];
        let next = self.points[next_index];
        let split = bezier::split_cubic(
            s,
            prev.knot,
            prev.knot + prev.tan_out,
            next.knot + next.tan_in,
            next.knot,
        );

        self.points[segment].tan_out = split.prev_tan_out;
        self.points[next_index].tan_in = split.next_tan_in;

        let index = segment + 1;
        self.points.insert(
            index,
            ControlPoint::with_tangents(split.point, split.tan_in, split.tan_out),
        );
        index
    }

    // --- geometry ---------------------------------------------------------

    /// Bounding rectangle of the knots (tangent handles excluded).
    pub fn bounding_rect(&self) -> Rect {
        let mut rect = Rect::NOTHING;
        for p in &self.points {
            rect.extend_with(p.knot);
        }
        rect
    }

    pub fn is_horizontal(&self) -> bool {
        let rect = self.bounding_rect();
        rect.width() > rect.height()
    }

    /// Center line of a 4-point Input rectangle, running along its long
    /// axis. Used by the detection driver to seed member midpoints.
    pub fn center_line(&self) -> (Pos2, Pos2) {
        assert_eq!(self.kind, ShapeKind::Input);
        assert_eq!(self.topology(), Topology::Polygon);
        assert_eq!(self.points.len(), 4);

        let mut knots: Vec<Pos2> = self.points.iter().map(|p| p.knot).collect();
        if self.is_horizontal() {
            knots.sort_by(|l, r| l.x.total_cmp(&r.x).then(l.y.total_cmp(&r.y)));
        } else {
            knots.sort_by(|l, r| l.y.total_cmp(&r.y).then(l.x.total_cmp(&r.x)));
        }
        let p0 = ((knots[0].to_vec2() + knots[1].to_vec2()) / 2.0).to_pos2();
        let p1 = ((knots[2].to_vec2() + knots[3].to_vec2()) / 2.0).to_pos2();
        (p0, p1)
    }

    /// Point on the closed contour at curve parameter `t`. The contour wraps:
    /// segment `n-1` runs from the last knot back to knot 0.
    pub fn eval(&self, t: f32) -> Pos2 {
        let n = self.points.len();
        let mut seg = t.floor() as usize;
        let s = t - seg as f32;
        if seg >= n {
            seg = 0;
        }
        let p0 = self.points[seg];
        let p1 = self.points[if seg == n - 1 { 0 } else { seg + 1 }];
        bezier::eval_cubic(s, p0.knot, p0.knot + p0.tan_out, p1.knot + p1.tan_in, p1.knot)
    }

    /// Flatten the closed contour to a polyline. Polygon topology yields the
    /// knots; Bezier topology samples each segment at the fixed chord count.
    pub fn contour(&self) -> Vec<Pos2> {
        match self.topology() {
            Topology::Polygon => self.points.iter().map(|p| p.knot).collect(),
            Topology::ClosedBezier => {
                let n = self.points.len();
                let mut out = Vec::with_capacity(n * CURVE_STEPS);
                for i in 0..n {
                    for s in 0..CURVE_STEPS {
                        out.push(self.eval(i as f32 + s as f32 / CURVE_STEPS as f32));
                    }
                }
                out
            }
        }
    }

    fn is_inverted(&self) -> bool {
        self.kind == ShapeKind::Mask && self.flag("invert")
    }

    /// Point-in-region test on the flattened contour. `doc` is the document
    /// rectangle, needed to honor an inverted mask (region = document with
    /// the shape cut out, even-odd).
    pub fn contains(&self, p: Pos2, doc: Option<Rect>) -> bool {
        let inside = point_in_contour(&self.contour(), p);
        match (self.is_inverted(), doc) {
            (true, Some(doc)) => doc.contains(p) != inside,
            _ => inside,
        }
    }

    /// Region/rectangle overlap, with the zero-area-rect-selects-nothing
    /// contract from the flattened-contour test.
    pub fn intersects(&self, rect: Rect, doc: Option<Rect>) -> bool {
        if rect.width() <= 0.0 || rect.height() <= 0.0 {
            return false;
        }
        let contour = self.contour();
        if self.is_inverted() && doc.is_some() {
            let corners = [
                rect.left_top(),
                rect.right_top(),
                rect.right_bottom(),
                rect.left_bottom(),
            ];
            if corners.iter().any(|c| self.contains(*c, doc)) {
                return true;
            }
            // The shape outline is the inner boundary of the region.
        }
        contour_intersects_rect(&contour, rect)
    }

    /// Curve proximity test: nearest sampled chord within `tolerance` of
    /// `pos`, returning the curve parameter for `insert_point`.
    pub fn point_on_curve(&self, pos: Pos2, tolerance: f32) -> Option<f32> {
        let n = self.points.len();
        for i in 0..n {
            let p0 = self.points[i];
            let p1 = self.points[if i == n - 1 { 0 } else { i + 1 }];
            let mut bounds = Rect::NOTHING;
            for p in [p0.knot, p0.knot + p0.tan_out, p1.knot + p1.tan_in, p1.knot] {
                bounds.extend_with(p);
            }
            if let Some(t) = bezier::point_on_segment_sampled(
                pos,
                tolerance,
                i as f32,
                (i + 1) as f32,
                bounds,
                |t| self.eval(t),
            ) {
                return Some(t);
            }
        }
        None
    }

    // --- transforms -------------------------------------------------------

    pub fn translate(&mut self, delta: Vec2) {
        for p in &mut self.points {
            p.knot += delta;
        }
    }

    /// Rotate every point around `anchor` by `angle` radians. Tangent
    /// offsets are rotated by transforming `knot + tangent` and
    /// re-subtracting the new knot, so they stay relative.
    pub fn rotate(&mut self, anchor: Pos2, angle: f32) {
        for p in &mut self.points {
            let old_knot = p.knot;
            p.knot = rotate_about(p.knot, anchor, angle);
            p.tan_in = rotate_about(old_knot + p.tan_in, anchor, angle) - p.knot;
            p.tan_out = rotate_about(old_knot + p.tan_out, anchor, angle) - p.knot;
        }
    }

    // --- attributes -------------------------------------------------------

    pub fn value(&self, key: &str) -> Option<AttrValue> {
        self.values.get(key).copied()
    }

    /// Numeric attribute with a zero default.
    pub fn number(&self, key: &str) -> f64 {
        self.value(key).map(|v| v.as_f64()).unwrap_or(0.0)
    }

    /// Boolean attribute with a false default.
    pub fn flag(&self, key: &str) -> bool {
        self.value(key).map(|v| v.as_bool()).unwrap_or(false)
    }

    /// Returns true when the stored value actually changed.
    pub fn set_value(&mut self, key: &str, value: AttrValue) -> bool {
        if self.values.get(key) == Some(&value) {
            return false;
        }
        self.values.insert(key.to_owned(), value);
        true
    }
}
