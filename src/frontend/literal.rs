//! Literal lowering.
//!
//! Most literal kinds are discriminated by the vendor's basic-type kind;
//! integer literals are re-parsed from their raw spelling because the
//! radix prefix and suffix decide both the stored value width and the
//! resulting C++ type.

use tracing::warn;

use crate::error::CpgError;
use crate::graph::node::LiteralValue;
use crate::graph::NodeId;
use crate::vendor::{VendorBasicKind, VendorExpr, VendorValue};

use super::Lowering;

const INT_MAX: u128 = i32::MAX as u128;
const LONG_MAX: u128 = i64::MAX as u128;

impl Lowering<'_> {
    pub(crate) fn handle_literal_expression(
        &mut self,
        ctx: &VendorExpr,
        value: &VendorValue,
        spelling: &str,
    ) -> NodeId {
        let vendor_type = self.expression_type(ctx);
        let generated_type = self.types.create_from(&vendor_type.spelling(), true);

        let number = match value {
            // e.g. for 0x1p-52 the vendor yields no numeric value
            VendorValue::Unevaluated => {
                return self.graph.new_literal(
                    LiteralValue::Text(spelling.to_string()),
                    generated_type,
                    &ctx.code,
                    ctx.location.clone(),
                );
            }
            VendorValue::CString(content) => {
                return self.graph.new_literal(
                    LiteralValue::String(content.clone()),
                    generated_type,
                    &ctx.code,
                    ctx.location.clone(),
                );
            }
            VendorValue::Number(number) => *number,
        };

        let value = match vendor_type.basic_kind() {
            Some(VendorBasicKind::Int) => return self.handle_integer_literal(ctx, spelling),
            Some(VendorBasicKind::Bool) => LiteralValue::Bool(number.as_i64() == 1),
            Some(VendorBasicKind::Float) => LiteralValue::Float(number.as_f32()),
            Some(VendorBasicKind::Double) => LiteralValue::Double(number.as_f64()),
            Some(VendorBasicKind::Char) => LiteralValue::Char(
                char::from_u32(number.as_i64() as u32).unwrap_or('\u{fffd}'),
            ),
            _ => LiteralValue::Text(spelling.to_string()),
        };

        self.graph
            .new_literal(value, generated_type, &ctx.code, ctx.location.clone())
    }

    fn handle_integer_literal(&mut self, ctx: &VendorExpr, spelling: &str) -> NodeId {
        let value = spelling.to_lowercase();

        let suffix = integer_suffix(&value);

        // first, strip the suffix from the value
        let stripped = &value[..value.len() - suffix.len()];

        // next, check for possible prefixes
        let (radix, offset) = if value.starts_with("0b") {
            (2, 2)
        } else if value.starts_with("0x") {
            (16, 2)
        } else if value.starts_with('0') && stripped.len() > 1 {
            (8, 1)
        } else {
            (10, 0)
        };

        let digits = &stripped[offset..];

        let big = match parse_integer(digits, radix, spelling) {
            Ok(v) => v,
            Err(err) => {
                warn!("{}: {}", ctx.location, err);
                let vendor_type = self.expression_type(ctx);
                let fallback = self.types.create_from(&vendor_type.spelling(), true);
                return self.graph.new_literal(
                    LiteralValue::Text(spelling.to_string()),
                    fallback,
                    &ctx.code,
                    ctx.location.clone(),
                );
            }
        };

        let (number, type_name) = match suffix {
            // unsigned long (long) is always kept in the wide representation
            "ull" | "ul" => (
                LiteralValue::BigInt(big),
                if suffix == "ul" {
                    "unsigned long"
                } else {
                    "unsigned long long"
                },
            ),
            "ll" | "l" => {
                if big > LONG_MAX {
                    warn!(
                        "{}: integer literal {} is too large to be represented in a signed type, interpreting it as unsigned",
                        ctx.location, spelling
                    );
                    (LiteralValue::BigInt(big), "unsigned long long")
                } else {
                    (
                        LiteralValue::Long(big as i64),
                        if suffix == "ll" { "long long" } else { "long" },
                    )
                }
            }
            // no (or unhandled) suffix: narrow to the smallest signed type
            // that holds the value
            _ => {
                if big > LONG_MAX {
                    warn!(
                        "{}: integer literal {} is too large to be represented in a signed type, interpreting it as unsigned",
                        ctx.location, spelling
                    );
                    (LiteralValue::BigInt(big), "unsigned long long")
                } else if big > INT_MAX {
                    (LiteralValue::Long(big as i64), "long")
                } else {
                    (LiteralValue::Int(big as i32), "int")
                }
            }
        };

        let ty = self.types.create_from(type_name, true);
        self.graph
            .new_literal(number, ty, &ctx.code, ctx.location.clone())
    }
}

/// The longest trailing run of `u`/`l` characters, capped at three.
fn integer_suffix(value: &str) -> &str {
    let mut suffix = "";
    for i in 1..=value.len().min(3) {
        match value.get(value.len() - i..) {
            Some(tail) if tail.chars().all(|c| c == 'u' || c == 'l') => suffix = tail,
            _ => break,
        }
    }
    suffix
}

fn parse_integer(digits: &str, radix: u32, spelling: &str) -> Result<u128, CpgError> {
    u128::from_str_radix(digits, radix).map_err(|e| {
        if *e.kind() == std::num::IntErrorKind::PosOverflow {
            CpgError::IntegerOverflow {
                literal: spelling.to_string(),
            }
        } else {
            CpgError::InvalidDigits {
                literal: spelling.to_string(),
                radix,
            }
        }
    })
}
