//! Translation of [`ConferenceQuery`] into SQL.

use conference_core::query::{ConferenceQuery, Field, FilterValue, Predicate, SortKey};
use sqlx::{Postgres, QueryBuilder};

/// Columns selected for every conference read
pub(crate) const CONFERENCE_COLUMNS: &str = "id, organizer_user_id, name, description, \
     topics, city, start_date, end_date, month, max_attendees, seats_available, version";

const fn column(field: Field) -> &'static str {
    match field {
        Field::City => "city",
        Field::Topic => "topics",
        Field::Month => "month",
        Field::MaxAttendees => "max_attendees",
        Field::SeatsAvailable => "seats_available",
    }
}

/// Builds `SELECT ... WHERE ... ORDER BY ...` for a conference query.
///
/// Text comparisons and ordering use the "C" collation so results agree
/// with byte-wise string ordering.
pub(crate) fn select_conferences(query: &ConferenceQuery) -> QueryBuilder<'static, Postgres> {
    let mut builder =
        QueryBuilder::new(format!("SELECT {CONFERENCE_COLUMNS} FROM conferences WHERE TRUE"));

    for predicate in query.predicates() {
        push_predicate(&mut builder, predicate);
    }

    builder.push(" ORDER BY ");
    let mut order = builder.separated(", ");
    for key in query.order() {
        match key {
            SortKey::Name => order.push("name COLLATE \"C\""),
            SortKey::Field(Field::City) => order.push("city COLLATE \"C\" NULLS FIRST"),
            SortKey::Field(field) => order.push(column(*field)),
        };
    }
    // Stable order between equal rows
    order.push("id");

    builder
}

fn push_predicate(builder: &mut QueryBuilder<'static, Postgres>, predicate: &Predicate) {
    let operator = predicate.operator.as_sql();
    match (predicate.field, &predicate.value) {
        (Field::Topic, FilterValue::Text(topic)) => {
            builder
                .push(" AND ")
                .push_bind(topic.clone())
                .push(" = ANY(topics)");
        }
        (field, FilterValue::Text(text)) => {
            builder
                .push(format!(" AND {} COLLATE \"C\" {operator} ", column(field)))
                .push_bind(text.clone());
        }
        (field, FilterValue::Number(number)) => {
            builder
                .push(format!(" AND {} {operator} ", column(field)))
                .push_bind(i64::from(*number));
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)] // Test code
mod tests {
    use super::*;
    use conference_core::query::{ConferenceQueryForm, Operator};

    #[test]
    fn empty_query_orders_by_name() {
        let builder = select_conferences(&ConferenceQuery::all());
        let sql = builder.sql();
        assert!(sql.ends_with("FROM conferences WHERE TRUE ORDER BY name COLLATE \"C\", id"));
    }

    #[test]
    fn inequality_field_sorts_first() {
        let form = ConferenceQueryForm::default()
            .filter(Field::City, Operator::Eq, "London")
            .filter(Field::Topic, Operator::Eq, "Rust")
            .filter(Field::MaxAttendees, Operator::Gt, "10");
        let query = ConferenceQuery::from_form(&form).unwrap();
        let builder = select_conferences(&query);
        let sql = builder.sql();

        assert!(sql.contains("AND city COLLATE \"C\" = $1"));
        assert!(sql.contains("AND $2 = ANY(topics)"));
        assert!(sql.contains("AND max_attendees > $3"));
        assert!(sql.ends_with("ORDER BY max_attendees, name COLLATE \"C\", id"));
    }

    #[test]
    fn not_equal_uses_sql_operator() {
        let form = ConferenceQueryForm::default().filter(Field::Month, Operator::Ne, "6");
        let query = ConferenceQuery::from_form(&form).unwrap();
        let builder = select_conferences(&query);
        let sql = builder.sql();

        assert!(sql.contains("AND month <> $1"));
    }
}
