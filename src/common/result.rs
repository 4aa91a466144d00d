use crate::common::error::MessError;

/// messプロジェクト全体で使用するResult型のエイリアス
///
/// # Examples
///
/// ```
/// use mess::common::result::MessResult;
/// use mess::common::error::MessError;
///
/// fn example_function() -> MessResult<String> {
///     Ok("success".to_string())
/// }
///
/// fn example_with_error() -> MessResult<()> {
///     Err(MessError::validation_error("name", "cannot be empty", None))
/// }
/// ```
pub type MessResult<T> = Result<T, MessError>;

/// Optionのエラー変換ヘルパー
pub trait OptionExt<T> {
    /// Option値をValidationErrorに変換する
    ///
    /// ```
    /// use mess::common::result::{MessResult, OptionExt};
    ///
    /// let none_value: Option<String> = None;
    /// let result: MessResult<String> = none_value.ok_or_validation_error("name", "required");
    /// assert!(result.is_err());
    /// ```
    fn ok_or_validation_error(
        self,
        field: impl Into<String>,
        message: impl Into<String>,
    ) -> MessResult<T>;
}

impl<T> OptionExt<T> for Option<T> {
    fn ok_or_validation_error(
        self,
        field: impl Into<String>,
        message: impl Into<String>,
    ) -> MessResult<T> {
        self.ok_or_else(|| MessError::validation_error(field, message, None))
    }
}
