//! Identifier and path conventions shared by the generators.

use heck::{ToSnakeCase, ToTitleCase, ToUpperCamelCase};
use std::path::{Component, Path, PathBuf};

pub fn title_case(s: &str) -> String {
    s.to_upper_camel_case()
}

pub fn snake_case(s: &str) -> String {
    s.to_snake_case()
}

/// Human-readable form of an identifier: `customer_id` -> `Customer Id`.
pub fn phrase(s: &str) -> String {
    s.trim_start_matches("r#").to_title_case()
}

/// `customer_id` -> `customer`, `customerId` -> `customer`. Anything else is returned unchanged.
pub fn strip_id_suffix(column: &str) -> String {
    for suffix in ["_id", "_ID"] {
        if let Some(base) = column.strip_suffix(suffix) {
            if !base.is_empty() && !base.ends_with('_') {
                return base.to_string();
            }
        }
    }
    if let Some(base) = column.strip_suffix("Id") {
        if base.chars().last().is_some_and(|c| c.is_ascii_lowercase() || c.is_ascii_digit()) {
            return base.to_string();
        }
    }
    column.to_string()
}

pub fn singularize(word: &str) -> String {
    if let Some(stem) = word.strip_suffix("ies") {
        if !stem.is_empty() {
            return format!("{stem}y");
        }
    }
    for suffix in ["sses", "shes", "ches", "xes", "zes", "uses"] {
        if let Some(stem) = word.strip_suffix(suffix) {
            return format!("{stem}{}", &suffix[..suffix.len() - 2]);
        }
    }
    if word.ends_with("ss") || word.ends_with("us") || word.ends_with("is") {
        return word.to_string();
    }
    match word.strip_suffix('s') {
        Some(stem) if !stem.is_empty() => stem.to_string(),
        _ => word.to_string(),
    }
}

/// Plural form. Already-plural words come back unchanged.
pub fn pluralize(word: &str) -> String {
    let base = singularize(word);
    if base.ends_with('y')
        && base.len() > 1
        && !matches!(
            base.chars().nth(base.len() - 2),
            Some('a' | 'e' | 'i' | 'o' | 'u')
        )
    {
        format!("{}ies", &base[..base.len() - 1])
    } else if base.ends_with('s')
        || base.ends_with('x')
        || base.ends_with('z')
        || base.ends_with("ch")
        || base.ends_with("sh")
    {
        format!("{base}es")
    } else {
        format!("{base}s")
    }
}

/// Getter name for a field: the field itself, or `is_<field>` for an unprefixed bool.
pub fn getter_name(field: &str, is_bool: bool) -> String {
    let bare = field.trim_start_matches("r#");
    if is_bool && !["is_", "has_", "can_"].iter().any(|p| bare.starts_with(p)) {
        format!("is_{bare}")
    } else {
        field.to_string()
    }
}

pub fn setter_name(field: &str) -> String {
    format!("set_{}", field.trim_start_matches("r#"))
}

/// Bare table name with the schema qualifier and the first matching prefix removed.
pub fn strip_table_prefix(table: &str, prefixes: &[String]) -> String {
    let bare = table.rsplit('.').next().unwrap_or(table);
    prefixes
        .iter()
        .find_map(|p| bare.strip_prefix(p.as_str()).filter(|rest| !rest.is_empty()))
        .unwrap_or(bare)
        .to_string()
}

/// File stem for a table's model: prefixes stripped, singular, snake case.
pub fn table_to_file_stem(table: &str, prefixes: &[String]) -> String {
    let stem = singularize(&snake_case(&strip_table_prefix(table, prefixes)));
    if stem.is_empty() { "model".to_string() } else { stem }
}

/// Normalize a user-supplied destination: forward slashes, no `./`, rooted under
/// `prefix` and ending in `.rs`. Absolute paths keep their root.
pub fn parse_filename(input: &str, prefix: &str) -> PathBuf {
    let mut s = input.trim().replace('\\', "/");
    while let Some(rest) = s.strip_prefix("./") {
        s = rest.to_string();
    }

    let prefix = prefix.trim_matches('/');
    let rooted = s == prefix || s.starts_with(&format!("{prefix}/"));
    if !rooted && !Path::new(&s).is_absolute() && !prefix.is_empty() {
        s = format!("{prefix}/{s}");
    }
    if !s.ends_with(".rs") {
        s.push_str(".rs");
    }
    PathBuf::from(s)
}

/// Module path and struct name for a source file.
///
/// `src/models/customer.rs` -> (`crate::models::customer`, `Customer`).
/// `mod.rs` names its directory. Paths outside `src/` just join their segments.
pub fn path_to_module(path: &Path) -> (String, String) {
    let parts: Vec<String> = path
        .with_extension("")
        .components()
        .filter_map(|c| match c {
            Component::Normal(s) => s.to_str().map(str::to_string),
            _ => None,
        })
        .collect();

    let Some((stem, dirs)) = parts.split_last() else {
        return ("crate".to_string(), "Model".to_string());
    };

    let mut module: Vec<String> = Vec::new();
    let mut dir_iter = dirs.iter();
    if dirs.first().map(String::as_str) == Some("src") {
        module.push("crate".to_string());
        dir_iter.next();
    }
    module.extend(dir_iter.map(|d| sanitize_field_ident(d)));

    let crate_root = module.len() == 1 && module[0] == "crate";
    let is_dir_module = stem == "mod" || (crate_root && matches!(stem.as_str(), "lib" | "main"));
    if !is_dir_module {
        module.push(sanitize_field_ident(stem));
    }
    if module.is_empty() {
        module.push("crate".to_string());
    }

    let struct_base = if stem == "mod" {
        dirs.last().unwrap_or(stem)
    } else {
        stem
    };

    (
        module.join("::"),
        sanitize_type_ident(&title_case(struct_base)),
    )
}

pub fn sanitize_type_ident(name: &str) -> String {
    let mut s = name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect::<String>();

    if s.is_empty() {
        s.push('_');
    }
    if s.starts_with(|c: char| c.is_ascii_digit()) {
        s.insert(0, '_');
    }
    if s == "Self" {
        s.push('_');
    }
    s
}

pub fn sanitize_field_ident(column: &str) -> String {
    let s = column
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect::<String>();
    let mut s = s.to_snake_case();
    if s.is_empty() {
        s.push('_');
    }
    if s.starts_with(|c: char| c.is_ascii_digit()) {
        s.insert(0, '_');
    }
    if is_rust_keyword(&s) {
        format!("r#{s}")
    } else {
        s
    }
}

fn is_rust_keyword(s: &str) -> bool {
    matches!(
        s,
        "as" | "break"
            | "const"
            | "continue"
            | "else"
            | "enum"
            | "extern"
            | "false"
            | "fn"
            | "for"
            | "if"
            | "impl"
            | "in"
            | "let"
            | "loop"
            | "match"
            | "mod"
            | "move"
            | "mut"
            | "pub"
            | "ref"
            | "return"
            | "static"
            | "struct"
            | "trait"
            | "true"
            | "type"
            | "unsafe"
            | "use"
            | "where"
            | "while"
            | "async"
            | "await"
            | "dyn"
            | "abstract"
            | "become"
            | "box"
            | "do"
            | "final"
            | "gen"
            | "macro"
            | "override"
            | "priv"
            | "typeof"
            | "unsized"
            | "virtual"
            | "yield"
            | "try"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn case_conversions() {
        assert_eq!(title_case("order_items"), "OrderItems");
        assert_eq!(snake_case("OrderItems"), "order_items");
        assert_eq!(phrase("customer_id"), "Customer Id");
    }

    #[test]
    fn strips_id_suffixes() {
        assert_eq!(strip_id_suffix("customer_id"), "customer");
        assert_eq!(strip_id_suffix("customerId"), "customer");
        assert_eq!(strip_id_suffix("id"), "id");
        assert_eq!(strip_id_suffix("paid"), "paid");
        assert_eq!(strip_id_suffix("owner"), "owner");
    }

    #[test]
    fn singular_and_plural_forms() {
        for (plural, singular) in [
            ("orders", "order"),
            ("categories", "category"),
            ("addresses", "address"),
            ("boxes", "box"),
            ("statuses", "status"),
            ("keys", "key"),
            ("order_items", "order_item"),
        ] {
            assert_eq!(singularize(plural), singular, "singularize({plural})");
            assert_eq!(pluralize(singular), plural, "pluralize({singular})");
            assert_eq!(pluralize(plural), plural, "pluralize({plural}) is stable");
        }
        assert_eq!(singularize("status"), "status");
        assert_eq!(singularize("address"), "address");
    }

    #[test]
    fn accessor_names() {
        assert_eq!(getter_name("active", true), "is_active");
        assert_eq!(getter_name("has_stock", true), "has_stock");
        assert_eq!(getter_name("email", false), "email");
        assert_eq!(setter_name("r#type"), "set_type");
    }

    #[test]
    fn table_file_stems() {
        let prefixes = vec!["app_".to_string()];
        assert_eq!(table_to_file_stem("customers", &prefixes), "customer");
        assert_eq!(table_to_file_stem("app_order_items", &prefixes), "order_item");
        assert_eq!(table_to_file_stem("public.categories", &[]), "category");
    }

    #[test]
    fn parse_filename_roots_and_suffixes() {
        assert_eq!(
            parse_filename("models/customer", "src"),
            PathBuf::from("src/models/customer.rs")
        );
        assert_eq!(
            parse_filename("./src/models/customer.rs", "src"),
            PathBuf::from("src/models/customer.rs")
        );
        assert_eq!(
            parse_filename("models\\order", "src"),
            PathBuf::from("src/models/order.rs")
        );
    }

    #[test]
    fn module_paths_for_files() {
        assert_eq!(
            path_to_module(Path::new("src/models/customer.rs")),
            ("crate::models::customer".to_string(), "Customer".to_string())
        );
        assert_eq!(
            path_to_module(Path::new("src/models/order_item.rs")),
            ("crate::models::order_item".to_string(), "OrderItem".to_string())
        );
        assert_eq!(
            path_to_module(Path::new("src/models/mod.rs")),
            ("crate::models".to_string(), "Models".to_string())
        );
        assert_eq!(
            path_to_module(Path::new("views/rs/user-profile.rs")),
            ("views::rs::user_profile".to_string(), "UserProfile".to_string())
        );
    }

    #[test]
    fn sanitizes_identifiers() {
        assert_eq!(sanitize_field_ident("type"), "r#type");
        assert_eq!(sanitize_field_ident("Order Total"), "order_total");
        assert_eq!(sanitize_field_ident("2fa"), "_2fa");
        assert_eq!(sanitize_type_ident("9lives"), "_9lives");
    }
}
