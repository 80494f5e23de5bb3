//! 错误定义
//!
//! 两个层面：
//! - [`NodeError`]：值行为不适用时返回的内部错误，由构建器与操作转换为诊断；
//! - [`ErrorConfig`]：生成用户可见异常（异常类名 + 消息）的构造器集合。

use thiserror::Error;

use crate::util::config::AnalyzerConfig;

/// 推断内部错误
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NodeError {
    /// 操作不适用于该类型
    #[error("{0}")]
    Type(String),

    /// 属性不存在
    #[error("{0}")]
    Attr(String),

    /// 不可赋值
    #[error("{0}")]
    Assign(String),
}

impl NodeError {
    /// 转换为用户可见异常
    pub fn to_spec(&self) -> ExcSpec {
        match self {
            NodeError::Type(msg) => ExcSpec::occur("TypeError", msg.clone()),
            NodeError::Attr(msg) | NodeError::Assign(msg) => {
                ExcSpec::occur("AttributeError", msg.clone())
            }
        }
    }
}

pub type NodeResult<T> = Result<T, NodeError>;

/// 待抛出的异常：异常类名、消息、确定性
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExcSpec {
    pub class: &'static str,
    pub message: String,
    /// `maybe` 类诊断
    pub uncertain: bool,
}

impl ExcSpec {
    pub fn occur(
        class: &'static str,
        message: impl Into<String>,
    ) -> Self {
        Self {
            class,
            message: message.into(),
            uncertain: false,
        }
    }

    pub fn maybe(
        class: &'static str,
        message: impl Into<String>,
    ) -> Self {
        Self {
            class,
            message: message.into(),
            uncertain: true,
        }
    }
}

/// 错误配置
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ErrorConfig {
    /// 是否报告 `maybe` 诊断
    pub raise_uncertain: bool,
    /// 作用于 `None` 的操作静默跳过
    pub ignore_none: bool,
    /// 导入失败不报告
    pub ignore_import_errors: bool,
}

impl Default for ErrorConfig {
    fn default() -> Self {
        Self {
            raise_uncertain: false,
            ignore_none: true,
            ignore_import_errors: false,
        }
    }
}

impl From<&AnalyzerConfig> for ErrorConfig {
    fn from(config: &AnalyzerConfig) -> Self {
        Self {
            raise_uncertain: config.raise_uncertain,
            ignore_none: config.ignore_none,
            ignore_import_errors: config.ignore_import_errors,
        }
    }
}

impl ErrorConfig {
    /// 是否应当抛出该异常
    pub fn enabled(
        &self,
        spec: &ExcSpec,
    ) -> bool {
        !spec.uncertain || self.raise_uncertain
    }

    pub fn attribute_not_found(
        obj: &str,
        name: &str,
    ) -> ExcSpec {
        ExcSpec::occur("AttributeError", format!("attribute not found: {}.{}", obj, name))
    }

    pub fn attribute_not_assignable(
        obj: &str,
        name: &str,
    ) -> ExcSpec {
        ExcSpec::occur("AttributeError", format!("cannot assign attribute: {}.{}", obj, name))
    }

    pub fn not_callable(obj: &str) -> ExcSpec {
        ExcSpec::occur("TypeError", format!("not callable: {}", obj))
    }

    pub fn too_few_args(
        given: usize,
        required: usize,
    ) -> ExcSpec {
        ExcSpec::occur(
            "TypeError",
            format!("too few args: {} given, {} required", given, required),
        )
    }

    pub fn too_many_args(
        given: usize,
        allowed: usize,
    ) -> ExcSpec {
        ExcSpec::occur(
            "TypeError",
            format!("too many args: {} given, {} allowed", given, allowed),
        )
    }

    pub fn invalid_keyword(name: &str) -> ExcSpec {
        ExcSpec::occur("TypeError", format!("invalid keyword argument: {}", name))
    }

    pub fn unsupported_operand(
        op: &str,
        left: &str,
        right: &str,
    ) -> ExcSpec {
        ExcSpec::occur(
            "TypeError",
            format!("unsupported operand type(s) for {}: {} and {}", op, left, right),
        )
    }

    pub fn bad_unary_operand(
        op: &str,
        operand: &str,
    ) -> ExcSpec {
        ExcSpec::occur(
            "TypeError",
            format!("bad operand type for unary {}: {}", op, operand),
        )
    }

    pub fn not_iterable(obj: &str) -> ExcSpec {
        ExcSpec::occur("TypeError", format!("iteration over non-sequence: {}", obj))
    }

    pub fn not_container(obj: &str) -> ExcSpec {
        ExcSpec::occur("TypeError", format!("argument is not a container: {}", obj))
    }

    pub fn no_len(obj: &str) -> ExcSpec {
        ExcSpec::occur("TypeError", format!("object of type {} has no len()", obj))
    }

    pub fn unsubscriptable(obj: &str) -> ExcSpec {
        ExcSpec::occur("TypeError", format!("unsubscriptable object: {}", obj))
    }

    pub fn item_not_assignable(obj: &str) -> ExcSpec {
        ExcSpec::occur(
            "TypeError",
            format!("object does not support item assignment: {}", obj),
        )
    }

    pub fn unpack_mismatch(
        targets: usize,
        values: usize,
    ) -> ExcSpec {
        ExcSpec::occur(
            "ValueError",
            format!(
                "tuple unpacking mismatch: {} values for {} targets",
                values, targets
            ),
        )
    }

    pub fn unpack_unknown(targets: usize) -> ExcSpec {
        ExcSpec::maybe(
            "ValueError",
            format!("tuple unpacking may not yield {} values", targets),
        )
    }

    pub fn index_out_of_range() -> ExcSpec {
        ExcSpec::maybe("IndexError", "index out of range")
    }

    pub fn tuple_index_out_of_range(
        index: i64,
        len: usize,
    ) -> ExcSpec {
        ExcSpec::occur(
            "IndexError",
            format!("tuple index out of range: {} (length {})", index, len),
        )
    }

    pub fn key_not_found() -> ExcSpec {
        ExcSpec::maybe("KeyError", "key not found")
    }

    pub fn zero_division() -> ExcSpec {
        ExcSpec::maybe("ZeroDivisionError", "division by zero")
    }

    pub fn type_mismatch(
        blame: &str,
        expected: &str,
        got: &str,
    ) -> ExcSpec {
        ExcSpec::occur(
            "TypeError",
            format!("{}: expected {}, got {}", blame, expected, got),
        )
    }

    pub fn name_not_defined(name: &str) -> ExcSpec {
        ExcSpec::occur("NameError", format!("name not defined: {}", name))
    }

    pub fn import_failed(
        name: &str,
        reason: &str,
    ) -> ExcSpec {
        ExcSpec::occur("ImportError", format!("cannot import {}: {}", name, reason))
    }

    pub fn name_not_in_module(
        module: &str,
        name: &str,
    ) -> ExcSpec {
        ExcSpec::occur("ImportError", format!("cannot import name {} from {}", name, module))
    }

    pub fn bare_raise() -> ExcSpec {
        ExcSpec::occur("SyntaxError", "raise with no argument outside of except clause")
    }

    pub fn bad_exception(obj: &str) -> ExcSpec {
        ExcSpec::occur(
            "TypeError",
            format!("exceptions must be classes or instances, not {}", obj),
        )
    }

    pub fn bad_dict_element(obj: &str) -> ExcSpec {
        ExcSpec::occur(
            "TypeError",
            format!("cannot convert dictionary update sequence element: {}", obj),
        )
    }

    pub fn bad_dict_length(len: usize) -> ExcSpec {
        ExcSpec::occur(
            "ValueError",
            format!("dictionary update sequence element has length {}; 2 is required", len),
        )
    }

    pub fn not_an_iterator(obj: &str) -> ExcSpec {
        ExcSpec::occur("TypeError", format!("object is not an iterator: {}", obj))
    }

    pub fn assertion_failed() -> ExcSpec {
        ExcSpec::maybe("AssertionError", "assertion may fail")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_error_conversion() {
        let spec = NodeError::Type("not callable: int".into()).to_spec();
        assert_eq!(spec.class, "TypeError");
        assert!(!spec.uncertain);
        assert_eq!(NodeError::Attr("x".into()).to_spec().class, "AttributeError");
    }

    #[test]
    fn test_uncertain_gated_by_config() {
        let mut config = ErrorConfig::default();
        assert!(!config.enabled(&ErrorConfig::key_not_found()));
        assert!(config.enabled(&ErrorConfig::too_few_args(0, 1)));
        config.raise_uncertain = true;
        assert!(config.enabled(&ErrorConfig::key_not_found()));
    }

    #[test]
    fn test_arity_message() {
        assert_eq!(
            ErrorConfig::too_few_args(0, 1).message,
            "too few args: 0 given, 1 required"
        );
    }
}
