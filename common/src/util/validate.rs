use once_cell::sync::Lazy;
use regex::Regex;
use validator::ValidationError;

static SLUG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[a-z0-9]+(?:-[a-z0-9]+)*$").expect("slug regex"));

/// 分类标识：小写字母、数字、中划线
pub fn validate_slug(slug: &str) -> Result<(), ValidationError> {
    if SLUG_RE.is_match(slug) {
        Ok(())
    } else {
        Err(ValidationError::new("slug").with_message("分类标识仅允许小写字母、数字和中划线".into()))
    }
}

/// 标签不能为空白
pub fn validate_tags(tags: &[String]) -> Result<(), ValidationError> {
    if tags.iter().any(|t| t.trim().is_empty()) {
        return Err(ValidationError::new("tags").with_message("标签不能为空".into()));
    }
    Ok(())
}
