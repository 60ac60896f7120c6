// This module implements AbsValue, the lattice element the abstract interpreter tracks for one
// runtime value. An AbsValue carries a data type tag, the formal parameter position it aliases
// (if any) and a constraint drawn from a closed set of variants: Top (no information), an
// integer range, or an object constraint (nullness, optional class, exact-class flag and
// whether the value is itself a class object). merge() is an in-place join that only mutates the
// receiver; mismatched data types collapse the receiver to Top with an unknown type, and
// parameter identity survives only when both sides agree on it.

//! Abstract values and their join.

use std::fmt;

/// Opaque class handle handed out by the class-hierarchy collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClassId(pub u32);

/// Data type tag of an abstract value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataType {
    Unknown,
    Int32,
    Int64,
    Float,
    Double,
    Address,
}

impl DataType {
    pub fn name(self) -> &'static str {
        match self {
            DataType::Unknown => "unknown",
            DataType::Int32 => "int",
            DataType::Int64 => "long",
            DataType::Float => "float",
            DataType::Double => "double",
            DataType::Address => "address",
        }
    }

    pub fn is_integral(self) -> bool {
        matches!(self, DataType::Int32 | DataType::Int64)
    }
}

/// What is known about a reference being null.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Nullness {
    Null,
    NonNull,
    Unknown,
}

impl Nullness {
    fn join(self, other: Nullness) -> Nullness {
        if self == other {
            self
        } else {
            Nullness::Unknown
        }
    }
}

/// Constraint on a reference value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObjectConstraint {
    pub nullness: Nullness,
    /// Static class of the referenced object, when known.
    pub class: Option<ClassId>,
    /// The class is the exact runtime class, not just an upper bound.
    pub exact: bool,
    /// The value is a class object (`Foo.class`) rather than an instance.
    pub class_object: bool,
}

impl ObjectConstraint {
    fn join(&self, other: &ObjectConstraint) -> Option<ObjectConstraint> {
        let nullness = self.nullness.join(other.nullness);

        // A definite null carries no class of its own and adopts the other side's.
        let (class, exact, class_object) = match (self.nullness, other.nullness) {
            (Nullness::Null, Nullness::Null) => {
                if self.class == other.class {
                    (self.class, self.exact && other.exact, false)
                } else {
                    (None, false, false)
                }
            }
            (Nullness::Null, _) => (other.class, other.exact, other.class_object),
            (_, Nullness::Null) => (self.class, self.exact, self.class_object),
            _ if self.class == other.class => (
                self.class,
                self.exact && other.exact,
                self.class_object && other.class_object,
            ),
            _ => (None, false, self.class_object && other.class_object),
        };

        let joined = ObjectConstraint { nullness, class, exact: exact && class.is_some(), class_object };
        if joined.nullness == Nullness::Unknown && joined.class.is_none() && !joined.class_object {
            None
        } else {
            Some(joined)
        }
    }
}

/// Constraint part of an abstract value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Constraint {
    /// No information.
    Top,
    /// Inclusive integer range.
    IntRange { low: i64, high: i64 },
    Object(ObjectConstraint),
}

/// Abstract lattice element over one runtime value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AbsValue {
    data_type: DataType,
    param_position: Option<u32>,
    constraint: Constraint,
}

impl AbsValue {
    /// Top of the given data type.
    pub fn top(data_type: DataType) -> Self {
        Self { data_type, param_position: None, constraint: Constraint::Top }
    }

    /// 32-bit integer within `[low, high]`.
    pub fn int_range(low: i64, high: i64) -> Self {
        assert!(low <= high, "Empty integer range [{}, {}]", low, high);
        Self {
            data_type: DataType::Int32,
            param_position: None,
            constraint: Constraint::IntRange { low, high },
        }
    }

    /// 32-bit integer constant.
    pub fn int_const(value: i64) -> Self {
        Self::int_range(value, value)
    }

    /// The null reference.
    pub fn null() -> Self {
        Self::object(ObjectConstraint {
            nullness: Nullness::Null,
            class: None,
            exact: false,
            class_object: false,
        })
    }

    /// A reference known to be non-null, class unknown.
    pub fn non_null() -> Self {
        Self::object(ObjectConstraint {
            nullness: Nullness::NonNull,
            class: None,
            exact: false,
            class_object: false,
        })
    }

    /// An instance of `class` (or, unless `exact`, of a subclass).
    pub fn instance_of(class: ClassId, nullness: Nullness, exact: bool) -> Self {
        Self::object(ObjectConstraint { nullness, class: Some(class), exact, class_object: false })
    }

    /// The class object of `class` itself.
    pub fn class_object(class: ClassId) -> Self {
        Self::object(ObjectConstraint {
            nullness: Nullness::NonNull,
            class: Some(class),
            exact: true,
            class_object: true,
        })
    }

    /// Reference value with the given constraint.
    pub fn object(constraint: ObjectConstraint) -> Self {
        Self {
            data_type: DataType::Address,
            param_position: None,
            constraint: Constraint::Object(constraint),
        }
    }

    /// Same value, marked as aliasing formal parameter `position`.
    pub fn with_param_position(mut self, position: u32) -> Self {
        self.param_position = Some(position);
        self
    }

    pub fn data_type(&self) -> DataType {
        self.data_type
    }

    pub fn param_position(&self) -> Option<u32> {
        self.param_position
    }

    pub fn set_param_position(&mut self, position: Option<u32>) {
        self.param_position = position;
    }

    pub fn is_parameter(&self) -> bool {
        self.param_position.is_some()
    }

    pub fn constraint(&self) -> &Constraint {
        &self.constraint
    }

    pub fn is_top(&self) -> bool {
        self.constraint == Constraint::Top
    }

    /// Forget the constraint; data type and parameter identity are kept.
    pub fn set_to_top(&mut self) {
        self.constraint = Constraint::Top;
    }

    /// Integer range, if this value has one.
    pub fn int_range_bounds(&self) -> Option<(i64, i64)> {
        match self.constraint {
            Constraint::IntRange { low, high } => Some((low, high)),
            _ => None,
        }
    }

    /// Object constraint, if this value has one.
    pub fn object_constraint(&self) -> Option<&ObjectConstraint> {
        match &self.constraint {
            Constraint::Object(obj) => Some(obj),
            _ => None,
        }
    }

    pub fn nullness(&self) -> Nullness {
        self.object_constraint().map_or(Nullness::Unknown, |obj| obj.nullness)
    }

    pub fn is_null(&self) -> bool {
        self.nullness() == Nullness::Null
    }

    pub fn is_non_null(&self) -> bool {
        self.nullness() == Nullness::NonNull
    }

    /// Join `other` into `self`.
    ///
    /// Only the receiver is mutated; `other` can be reused or dropped afterwards.
    pub fn merge(&mut self, other: &AbsValue) {
        if self.data_type != other.data_type {
            self.data_type = DataType::Unknown;
            self.param_position = None;
            self.constraint = Constraint::Top;
            return;
        }

        if self.param_position != other.param_position {
            self.param_position = None;
        }

        self.constraint = match (&self.constraint, &other.constraint) {
            (Constraint::Top, _) | (_, Constraint::Top) => Constraint::Top,
            (
                Constraint::IntRange { low: l1, high: h1 },
                Constraint::IntRange { low: l2, high: h2 },
            ) => Constraint::IntRange { low: (*l1).min(*l2), high: (*h1).max(*h2) },
            (Constraint::Object(a), Constraint::Object(b)) => {
                a.join(b).map_or(Constraint::Top, Constraint::Object)
            }
            _ => Constraint::Top,
        };
    }
}

impl fmt::Display for AbsValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.constraint {
            Constraint::Top => write!(f, "top({})", self.data_type.name())?,
            Constraint::IntRange { low, high } if low == high => write!(f, "int {}", low)?,
            Constraint::IntRange { low, high } => write!(f, "int[{}, {}]", low, high)?,
            Constraint::Object(obj) => {
                match obj.nullness {
                    Nullness::Null => write!(f, "null")?,
                    Nullness::NonNull => write!(f, "nonnull")?,
                    Nullness::Unknown => write!(f, "ref")?,
                }
                if let Some(class) = obj.class {
                    let tag = if obj.class_object {
                        "classobj"
                    } else if obj.exact {
                        "exact"
                    } else {
                        "class"
                    };
                    write!(f, " {} #{}", tag, class.0)?;
                }
            }
        }
        if let Some(pos) = self.param_position {
            write!(f, " (param {})", pos)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_int_ranges_join_to_hull() {
        let mut v = AbsValue::int_range(0, 5);
        v.merge(&AbsValue::int_range(3, 10));
        assert_eq!(v.int_range_bounds(), Some((0, 10)));
        assert_eq!(v.data_type(), DataType::Int32);
    }

    #[test]
    fn test_merge_with_top_is_top() {
        let mut v = AbsValue::int_const(7);
        v.merge(&AbsValue::top(DataType::Int32));
        assert!(v.is_top());
        assert_eq!(v.data_type(), DataType::Int32);

        let mut top = AbsValue::top(DataType::Int32);
        top.merge(&AbsValue::int_const(7));
        assert!(top.is_top());
    }

    #[test]
    fn test_type_mismatch_resets_to_unknown_top() {
        let mut v = AbsValue::int_const(1).with_param_position(0);
        v.merge(&AbsValue::non_null().with_param_position(0));
        assert!(v.is_top());
        assert_eq!(v.data_type(), DataType::Unknown);
        assert_eq!(v.param_position(), None);
    }

    #[test]
    fn test_parameter_identity() {
        let mut same = AbsValue::int_const(1).with_param_position(2);
        same.merge(&AbsValue::int_const(4).with_param_position(2));
        assert_eq!(same.param_position(), Some(2));

        let mut differ = AbsValue::int_const(1).with_param_position(2);
        differ.merge(&AbsValue::int_const(4).with_param_position(3));
        assert_eq!(differ.param_position(), None);
        assert_eq!(differ.int_range_bounds(), Some((1, 4)));
    }

    #[test]
    fn test_merge_with_own_clone_is_idempotent() {
        let values = [
            AbsValue::int_range(-3, 9).with_param_position(1),
            AbsValue::null(),
            AbsValue::non_null(),
            AbsValue::instance_of(ClassId(4), Nullness::NonNull, true),
            AbsValue::class_object(ClassId(2)),
        ];
        for v in values {
            let mut merged = v.clone();
            merged.merge(&v.clone());
            assert_eq!(merged, v);
        }
    }

    #[test]
    fn test_merge_is_commutative() {
        let values = [
            AbsValue::int_range(0, 1),
            AbsValue::int_range(5, 8),
            AbsValue::null(),
            AbsValue::instance_of(ClassId(1), Nullness::NonNull, true),
            AbsValue::instance_of(ClassId(2), Nullness::Unknown, false),
            AbsValue::class_object(ClassId(1)),
            AbsValue::top(DataType::Address),
        ];
        for a in &values {
            for b in &values {
                let mut ab = a.clone();
                ab.merge(b);
                let mut ba = b.clone();
                ba.merge(a);
                assert_eq!(ab, ba, "merge({}, {}) differs from merge({}, {})", a, b, b, a);
            }
        }
    }

    #[test]
    fn test_null_adopts_other_class() {
        let mut v = AbsValue::null();
        v.merge(&AbsValue::instance_of(ClassId(3), Nullness::NonNull, true));
        let obj = v.object_constraint().unwrap();
        assert_eq!(obj.nullness, Nullness::Unknown);
        assert_eq!(obj.class, Some(ClassId(3)));
        assert!(obj.exact);
    }

    #[test]
    fn test_unrelated_objects_lose_class() {
        let mut v = AbsValue::instance_of(ClassId(1), Nullness::NonNull, true);
        v.merge(&AbsValue::instance_of(ClassId(2), Nullness::NonNull, true));
        let obj = v.object_constraint().unwrap();
        assert_eq!(obj.nullness, Nullness::NonNull);
        assert_eq!(obj.class, None);
        assert!(!obj.exact);

        let mut w = AbsValue::instance_of(ClassId(1), Nullness::NonNull, false);
        w.merge(&AbsValue::instance_of(ClassId(2), Nullness::Unknown, false));
        assert!(w.is_top());
    }

    #[test]
    fn test_set_to_top_keeps_identity() {
        let mut v = AbsValue::int_const(3).with_param_position(0);
        v.set_to_top();
        assert!(v.is_top());
        assert_eq!(v.param_position(), Some(0));
        assert_eq!(v.data_type(), DataType::Int32);
    }

    #[test]
    fn test_display() {
        assert_eq!(AbsValue::int_range(1, 4).to_string(), "int[1, 4]");
        assert_eq!(AbsValue::int_const(4).with_param_position(1).to_string(), "int 4 (param 1)");
        assert_eq!(AbsValue::null().to_string(), "null");
        assert_eq!(AbsValue::class_object(ClassId(9)).to_string(), "nonnull classobj #9");
        assert_eq!(AbsValue::top(DataType::Address).to_string(), "top(address)");
    }
}
