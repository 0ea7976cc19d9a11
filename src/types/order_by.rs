//! Allow-listed sorting.
//!
//! Each resource declares which external field names may be sorted on and the
//! storage column each one maps to. [`compile`] turns a caller-supplied
//! expression such as `+Name,-OtherName` into an [`OrderBy`] that can be
//! applied to any sea-orm query.

use sea_orm::sea_query::{Alias, Expr};
use sea_orm::{ColumnTrait, Order, QueryOrder};

use crate::errors::{AppError, AppResult};

/// Sort direction of a single key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    #[default]
    Asc,
    Desc,
}

impl From<Direction> for Order {
    fn from(direction: Direction) -> Self {
        match direction {
            Direction::Asc => Order::Asc,
            Direction::Desc => Order::Desc,
        }
    }
}

/// What a sort key orders by.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SortTarget<C> {
    /// A declared sortable column.
    Column(C),
    /// A raw column reference: `column`, `table.column` or
    /// `schema.table.column`.
    Path(Vec<String>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortKey<C> {
    pub target: SortTarget<C>,
    pub direction: Direction,
}

/// An ordered list of sort keys, applied primary first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBy<C> {
    keys: Vec<SortKey<C>>,
}

impl<C> Default for OrderBy<C> {
    fn default() -> Self {
        Self { keys: Vec::new() }
    }
}

impl<C: ColumnTrait> OrderBy<C> {
    pub fn ascending(column: C) -> Self {
        Self::default().then(column, Direction::Asc)
    }

    pub fn descending(column: C) -> Self {
        Self::default().then(column, Direction::Desc)
    }

    /// Append a column key.
    pub fn then(mut self, column: C, direction: Direction) -> Self {
        self.keys.push(SortKey {
            target: SortTarget::Column(column),
            direction,
        });
        self
    }

    pub fn keys(&self) -> &[SortKey<C>] {
        &self.keys
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Use `fallback` when no key was requested.
    pub fn or(self, fallback: OrderBy<C>) -> Self {
        if self.is_empty() {
            fallback
        } else {
            self
        }
    }

    pub fn apply<Q: QueryOrder>(&self, query: Q) -> Q {
        self.keys.iter().fold(query, |query, key| {
            let order = Order::from(key.direction);
            match &key.target {
                SortTarget::Column(column) => query.order_by(*column, order),
                SortTarget::Path(segments) => query.order_by(path_expr(segments), order),
            }
        })
    }
}

fn path_expr(segments: &[String]) -> Expr {
    match segments {
        [column] => Expr::col(Alias::new(column)),
        [table, column] => Expr::col((Alias::new(table), Alias::new(column))),
        [schema, table, column] => Expr::col((
            Alias::new(schema),
            Alias::new(table),
            Alias::new(column),
        )),
        // compile() never produces other shapes
        _ => Expr::col(Alias::new(segments.join("."))),
    }
}

/// A sortable external name bound to its storage column.
#[derive(Debug, Clone, Copy)]
pub struct SortableField<C: 'static> {
    pub name: &'static str,
    pub column: C,
}

/// Resources that expose a sort allow-list.
pub trait SortableResource {
    type Column: ColumnTrait;

    const SORTABLE_FIELDS: &'static [SortableField<Self::Column>];
}

/// Compile an order-by expression against the allow-list of `R`.
///
/// `always_accept` names extra storage columns that are accepted for this
/// query only. Names are matched case-insensitively; dotted names are taken
/// as column paths without lookup.
pub fn compile<R: SortableResource>(
    expression: &str,
    always_accept: &[&str],
) -> AppResult<OrderBy<R::Column>> {
    let mut order = OrderBy::default();
    let mut invalid: Vec<String> = Vec::new();

    for token in expression.split(',').map(str::trim).filter(|t| !t.is_empty()) {
        let (direction, name) = if let Some(rest) = token.strip_prefix('-') {
            (Direction::Desc, rest.trim())
        } else if let Some(rest) = token.strip_prefix('+') {
            (Direction::Asc, rest.trim())
        } else {
            (Direction::Asc, token)
        };

        match resolve::<R>(name, always_accept) {
            Some(target) => order.keys.push(SortKey { target, direction }),
            None if name.is_empty() => invalid.push(token.to_string()),
            None => invalid.push(name.to_string()),
        }
    }

    if invalid.is_empty() {
        return Ok(order);
    }

    let allowed: Vec<&str> = R::SORTABLE_FIELDS
        .iter()
        .map(|f| f.name)
        .chain(always_accept.iter().copied())
        .collect();

    let message = if allowed.is_empty() {
        "There is no specific column for order by.".to_string()
    } else {
        format!(
            "{}: is/are invalid column(s) to order by. Please use one of these properties: {}",
            invalid.join(", "),
            allowed.join(", ")
        )
    };

    Err(AppError::invalid_model("orderBy", message))
}

fn resolve<R: SortableResource>(name: &str, always_accept: &[&str]) -> Option<SortTarget<R::Column>> {
    if name.is_empty() {
        return None;
    }

    if name.contains('.') {
        let segments: Vec<String> = name.split('.').map(str::to_string).collect();
        let well_formed = segments.len() <= 3 && segments.iter().all(|s| !s.is_empty());
        return well_formed.then_some(SortTarget::Path(segments));
    }

    if let Some(field) = R::SORTABLE_FIELDS
        .iter()
        .find(|f| f.name.eq_ignore_ascii_case(name))
    {
        return Some(SortTarget::Column(field.column));
    }

    always_accept
        .iter()
        .find(|accepted| accepted.eq_ignore_ascii_case(name))
        .map(|accepted| SortTarget::Path(vec![accepted.to_string()]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::CategoryResource;
    use crate::infra::repositories::entities::category;
    use sea_orm::{DbBackend, EntityTrait, IdenStatic, QueryTrait};

    struct Unsortable;

    impl SortableResource for Unsortable {
        type Column = category::Column;
        const SORTABLE_FIELDS: &'static [SortableField<category::Column>] = &[];
    }

    fn keys(order: &OrderBy<category::Column>) -> Vec<(String, Direction)> {
        order
            .keys()
            .iter()
            .map(|key| {
                let name = match &key.target {
                    SortTarget::Column(column) => column.as_str().to_string(),
                    SortTarget::Path(segments) => segments.join("."),
                };
                (name, key.direction)
            })
            .collect()
    }

    fn message_of(err: AppError) -> String {
        match err {
            AppError::InvalidModel(d) => d.errors["orderBy"].iter().next().unwrap().clone(),
            other => panic!("expected InvalidModel, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_expression_has_no_keys() {
        assert!(compile::<CategoryResource>("", &[]).unwrap().is_empty());
        assert!(compile::<CategoryResource>(" , ,", &[]).unwrap().is_empty());
    }

    #[test]
    fn test_prefixes_and_case() {
        let order = compile::<CategoryResource>("+name, -OTHERNAME", &[]).unwrap();
        assert_eq!(
            keys(&order),
            vec![
                ("name".to_string(), Direction::Asc),
                ("other_name".to_string(), Direction::Desc),
            ]
        );
    }

    #[test]
    fn test_unknown_column_lists_allowed_names() {
        let err = compile::<CategoryResource>("invalidcol", &[]).unwrap_err();
        assert_eq!(
            message_of(err),
            "invalidcol: is/are invalid column(s) to order by. \
             Please use one of these properties: Name, OtherName"
        );
    }

    #[test]
    fn test_invalid_tokens_collected() {
        let err = compile::<CategoryResource>("a,Name,-b", &["created_on"]).unwrap_err();
        assert_eq!(
            message_of(err),
            "a, b: is/are invalid column(s) to order by. \
             Please use one of these properties: Name, OtherName, created_on"
        );
    }

    #[test]
    fn test_bare_prefix_is_reported_as_written() {
        let message = message_of(compile::<CategoryResource>("Name, -", &[]).unwrap_err());
        assert!(message.starts_with("-: is/are invalid column(s)"));

        let message = message_of(compile::<CategoryResource>("+,Name", &[]).unwrap_err());
        assert!(message.starts_with("+: is/are invalid column(s)"));
    }

    #[test]
    fn test_no_sortable_columns() {
        let err = compile::<Unsortable>("Name", &[]).unwrap_err();
        assert_eq!(message_of(err), "There is no specific column for order by.");
    }

    #[test]
    fn test_always_accept_and_paths() {
        let order =
            compile::<CategoryResource>("-Created_On,categories.name", &["created_on"]).unwrap();
        assert_eq!(
            keys(&order),
            vec![
                ("created_on".to_string(), Direction::Desc),
                ("categories.name".to_string(), Direction::Asc),
            ]
        );
        assert!(matches!(order.keys()[1].target, SortTarget::Path(ref p) if p.len() == 2));
    }

    #[test]
    fn test_malformed_paths_rejected() {
        assert!(compile::<CategoryResource>("a..b", &[]).is_err());
        assert!(compile::<CategoryResource>("a.b.c.d", &[]).is_err());
        assert!(compile::<CategoryResource>("-", &[]).is_err());
    }

    #[test]
    fn test_repeated_names_applied_in_order() {
        let order = compile::<CategoryResource>("Name,-Name", &[]).unwrap();
        assert_eq!(order.keys().len(), 2);

        let sql = order
            .apply(category::Entity::find())
            .build(DbBackend::Sqlite)
            .to_string();
        let asc = sql.find(r#""name" ASC"#).unwrap();
        let desc = sql.find(r#""name" DESC"#).unwrap();
        assert!(asc < desc);
    }

    #[test]
    fn test_fallback_only_when_empty() {
        let fallback = OrderBy::ascending(category::Column::Id);
        let requested = OrderBy::descending(category::Column::Name);

        assert_eq!(keys(&OrderBy::default().or(fallback.clone())), keys(&fallback));
        assert_eq!(keys(&requested.clone().or(fallback)), keys(&requested));
    }
}
