use std::collections::HashMap;

use parking_lot::RwLock;

use crate::error::TypeError;
use crate::tag::ValueTag;
use crate::value::FfiValue;

/// A single registered `(source, target)` conversion rule.
pub trait Converter: Send + Sync {
    fn convert(&self, value: &FfiValue) -> Result<FfiValue, TypeError>;
}

impl<F> Converter for F
where
    F: Fn(&FfiValue) -> Result<FfiValue, TypeError> + Send + Sync,
{
    fn convert(&self, value: &FfiValue) -> Result<FfiValue, TypeError> {
        self(value)
    }
}

/// Registry of compiled `(source tag, target tag) -> converter` mappings
/// (`spec.md` §4.5). Read-mostly, guarded by an `RwLock` (`spec.md` §5: "The
/// type system and routing table are read-mostly and guarded by
/// reader-writer locks.").
#[derive(Default)]
pub struct ConversionRegistry {
    rules: RwLock<HashMap<(ValueTag, ValueTag), Box<dyn Converter>>>,
}

impl ConversionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a conversion rule, overwriting any prior rule for the same
    /// `(from, to)` pair.
    pub fn register(&self, from: ValueTag, to: ValueTag, converter: impl Converter + 'static) {
        self.rules.write().insert((from, to), Box::new(converter));
    }

    /// Converts `value` from its own tag to `target`, failing with
    /// `TypeMismatch` if no rule is registered and `RangeError` if the rule
    /// itself reports a narrowing overflow.
    pub fn convert(&self, value: &FfiValue, target: ValueTag) -> Result<FfiValue, TypeError> {
        let from = value.tag();
        if from == target {
            return Ok(value.clone());
        }
        let rules = self.rules.read();
        let rule = rules
            .get(&(from, target))
            .ok_or(TypeError::NoConversionRule { from, to: target })?;
        rule.convert(value)
    }

    pub fn has_rule(&self, from: ValueTag, to: ValueTag) -> bool {
        self.rules.read().contains_key(&(from, to))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn install_i32_i64_pair(reg: &ConversionRegistry) {
        reg.register(ValueTag::I32, ValueTag::I64, |v: &FfiValue| match v {
            FfiValue::I32(n) => Ok(FfiValue::I64(*n as i64)),
            _ => Err(TypeError::NoConversionRule { from: ValueTag::I32, to: ValueTag::I64 }),
        });
        reg.register(ValueTag::I64, ValueTag::I32, |v: &FfiValue| match v {
            FfiValue::I64(n) => {
                let narrowed = i32::try_from(*n).map_err(|_| TypeError::RangeError {
                    from: ValueTag::I64,
                    to: ValueTag::I32,
                })?;
                Ok(FfiValue::I32(narrowed))
            }
            _ => Err(TypeError::NoConversionRule { from: ValueTag::I64, to: ValueTag::I32 }),
        });
    }

    #[test]
    fn missing_rule_is_type_mismatch() {
        let reg = ConversionRegistry::new();
        let err = reg.convert(&FfiValue::I32(1), ValueTag::String).unwrap_err();
        assert!(matches!(err, TypeError::NoConversionRule { .. }));
    }

    #[test]
    fn widening_then_narrowing_round_trips() {
        let reg = ConversionRegistry::new();
        install_i32_i64_pair(&reg);

        let original = FfiValue::I32(42);
        let widened = reg.convert(&original, ValueTag::I64).unwrap();
        assert_eq!(widened, FfiValue::I64(42));
        let narrowed = reg.convert(&widened, ValueTag::I32).unwrap();
        assert_eq!(narrowed, original);
    }

    #[test]
    fn narrowing_overflow_is_range_error() {
        let reg = ConversionRegistry::new();
        install_i32_i64_pair(&reg);

        let too_big = FfiValue::I64(i64::MAX);
        let err = reg.convert(&too_big, ValueTag::I32).unwrap_err();
        assert!(matches!(err, TypeError::RangeError { .. }));
    }

    #[test]
    fn identity_conversion_never_needs_a_rule() {
        let reg = ConversionRegistry::new();
        let v = FfiValue::String("same".into());
        assert_eq!(reg.convert(&v, ValueTag::String).unwrap(), v);
    }
}
