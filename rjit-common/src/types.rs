//! Resolved type model
//!
//! The semantic analyzer annotates every AST node with one of these types and
//! the IR layer trusts the annotation: it never re-derives types, it only
//! inspects them (width, signedness, pointee, return type).

use serde::{Deserialize, Serialize};
use std::fmt;

/// A resolved type: primitive, const-qualified, pointer or function type
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Type {
    Void,
    /// Result of comparisons and condition of branches
    Bool,
    Int8,
    Int32,
    UInt8,
    UInt32,
    /// String literal
    Str,
    /// Const-qualified type (right values such as literals)
    Const(Box<Type>),
    Pointer(Box<Type>),
    Function {
        params: Vec<Type>,
        ret: Box<Type>,
    },
    /// Type of basic blocks
    Label,
}

impl Type {
    pub fn pointer_to(pointee: Type) -> Type {
        Type::Pointer(Box::new(pointee))
    }

    pub fn constant(inner: Type) -> Type {
        match inner {
            Type::Const(_) => inner,
            other => Type::Const(Box::new(other)),
        }
    }

    pub fn function(params: Vec<Type>, ret: Type) -> Type {
        Type::Function {
            params,
            ret: Box::new(ret),
        }
    }

    /// Strip const qualifiers
    pub fn unqualified(&self) -> &Type {
        match self {
            Type::Const(inner) => inner.unqualified(),
            other => other,
        }
    }

    pub fn is_void(&self) -> bool {
        matches!(self.unqualified(), Type::Void)
    }

    pub fn is_bool(&self) -> bool {
        matches!(self.unqualified(), Type::Bool)
    }

    /// Integer types, including the one-bit boolean
    pub fn is_integer(&self) -> bool {
        matches!(
            self.unqualified(),
            Type::Bool | Type::Int8 | Type::Int32 | Type::UInt8 | Type::UInt32
        )
    }

    pub fn is_signed(&self) -> bool {
        matches!(self.unqualified(), Type::Int8 | Type::Int32)
    }

    pub fn is_pointer(&self) -> bool {
        matches!(self.unqualified(), Type::Pointer(_))
    }

    pub fn is_function(&self) -> bool {
        matches!(self.unqualified(), Type::Function { .. })
    }

    /// Width in bits of integer types
    pub fn bit_width(&self) -> Option<u32> {
        match self.unqualified() {
            Type::Bool => Some(1),
            Type::Int8 | Type::UInt8 => Some(8),
            Type::Int32 | Type::UInt32 => Some(32),
            _ => None,
        }
    }

    pub fn pointee(&self) -> Option<&Type> {
        match self.unqualified() {
            Type::Pointer(inner) => Some(inner),
            _ => None,
        }
    }

    pub fn return_type(&self) -> Option<&Type> {
        match self.unqualified() {
            Type::Function { ret, .. } => Some(ret),
            _ => None,
        }
    }

    pub fn param_types(&self) -> &[Type] {
        match self.unqualified() {
            Type::Function { params, .. } => params,
            _ => &[],
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Void => write!(f, "void"),
            Type::Bool => write!(f, "i1"),
            Type::Int8 => write!(f, "i8"),
            Type::Int32 => write!(f, "i32"),
            Type::UInt8 => write!(f, "u8"),
            Type::UInt32 => write!(f, "u32"),
            Type::Str => write!(f, "str"),
            // const is a source-level qualifier, the IR prints the storage type
            Type::Const(inner) => write!(f, "{inner}"),
            Type::Pointer(inner) => write!(f, "{inner}*"),
            Type::Function { params, ret } => {
                write!(f, "{ret} (")?;
                for (i, param) in params.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{param}")?;
                }
                write!(f, ")")
            }
            Type::Label => write!(f, "label"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_const_is_transparent() {
        let lit = Type::constant(Type::Int32);
        assert!(matches!(lit, Type::Const(_)));
        assert!(lit.is_integer());
        assert!(lit.is_signed());
        assert_eq!(lit.unqualified(), &Type::Int32);
        assert_eq!(Type::constant(lit.clone()), lit);
        assert_eq!(lit.to_string(), "i32");
    }

    #[test]
    fn test_widths_and_signedness() {
        assert_eq!(Type::Bool.bit_width(), Some(1));
        assert_eq!(Type::UInt8.bit_width(), Some(8));
        assert_eq!(Type::Int32.bit_width(), Some(32));
        assert_eq!(Type::Str.bit_width(), None);
        assert!(!Type::UInt32.is_signed());
        assert!(Type::Int8.is_signed());
        assert!(!Type::Str.is_integer());
    }

    #[test]
    fn test_pointer_and_function() {
        let ptr = Type::pointer_to(Type::Int8);
        assert!(ptr.is_pointer());
        assert_eq!(ptr.pointee(), Some(&Type::Int8));
        assert_eq!(ptr.to_string(), "i8*");

        let func = Type::function(vec![Type::Int32, Type::UInt8], Type::Void);
        assert!(func.is_function());
        assert_eq!(func.return_type(), Some(&Type::Void));
        assert_eq!(func.param_types().len(), 2);
        assert_eq!(func.to_string(), "void (i32, u8)");
        assert!(Type::Int32.param_types().is_empty());
    }
}
