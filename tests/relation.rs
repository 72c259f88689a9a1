//! Relation behaviour against a recording connection.

mod common;

use common::{post_row, recording, user_row, Post, User};
use fake::faker::name::en::Name;
use fake::Fake;
use quarry::test_helpers::RecordingConnection;
use quarry::{
    Conditions, Entity, Executed, JoinSpec, Params, QuarryError, Relation, Row, SharedConnection,
};
use sea_query::Value;
use std::sync::Arc;

fn shared(conn: &Arc<RecordingConnection>) -> SharedConnection {
    conn.clone()
}

#[test]
fn test_user_end_to_end() {
    let newest: String = Name().fake();
    let older: String = Name().fake();
    let conn = recording(vec![vec![user_row(9, &newest), user_row(4, &older)]]);

    let users = User::query()
        .with_connection(shared(&conn))
        .filter(Conditions::new().eq("name", newest.as_str()))
        .order_by(("id", -1))
        .take(2)
        .all()
        .unwrap()
        .into_entities::<User>()
        .unwrap();

    assert_eq!(users.len(), 2);
    assert_eq!(users[0].id, 9);
    assert_eq!(users[0].name, newest);
    assert_eq!(users[1].name, older);

    let statement = &conn.statements()[0];
    let (sql, values) = statement.build().unwrap();
    assert_eq!(
        sql,
        r#"SELECT * FROM "users" WHERE "users"."name" = $1 ORDER BY "id" DESC LIMIT $2"#
    );
    assert_eq!(values.0[0], Value::from(newest));
}

#[test]
fn test_sequence_filter_renders_in() {
    let sql = User::query()
        .filter(Conditions::new().any("id", [1, 2, 3]))
        .to_sql()
        .unwrap();
    assert_eq!(sql, r#"SELECT * FROM "users" WHERE "users"."id" IN (1, 2, 3)"#);
}

#[test]
fn test_raw_fragments_with_params() {
    let sql = User::query()
        .where_raw("age > ? AND age < ?", Params::positional([18, 65]))
        .where_raw("name LIKE :pattern", Params::named([("pattern", "A%")]))
        .to_sql()
        .unwrap();
    assert!(sql.starts_with(r#"SELECT * FROM "users" WHERE "#), "{sql}");
    assert!(sql.contains("age > 18 AND age < 65"), "{sql}");
    assert!(sql.contains("name LIKE 'A%'"), "{sql}");
}

#[test]
fn test_missing_named_parameter() {
    let err = User::query()
        .where_raw("name = :name", Params::named([("other", "x")]))
        .to_sql()
        .unwrap_err();
    assert!(matches!(err, QuarryError::MissingParameter(name) if name == "name"));
}

#[test]
fn test_raw_fragment_placeholder_count_mismatch() {
    let err = User::query()
        .where_raw("age > ? AND age < ?", Params::positional([18]))
        .to_sql()
        .unwrap_err();
    assert!(matches!(
        err,
        QuarryError::ParameterCount { placeholders: 2, values: 1 }
    ));
}

#[test]
fn test_raw_fragment_quoted_literals_are_left_alone() {
    let sql = User::query()
        .where_raw("name <> '?' AND note <> 'at 10:30' AND id = ?", Params::positional([7]))
        .to_sql()
        .unwrap();
    assert!(sql.contains("name <> '?' AND note <> 'at 10:30' AND id = 7"), "{sql}");

    let sql = User::query()
        .where_raw(
            "note <> 'due 10:30' AND name = :name",
            Params::named([("name", "ann")]),
        )
        .to_sql()
        .unwrap();
    assert!(sql.contains("note <> 'due 10:30' AND name = 'ann'"), "{sql}");
}

#[test]
fn test_to_sql_reports_builder_misuse() {
    let err = User::query().includes("spaceships").to_sql().unwrap_err();
    assert!(matches!(err, QuarryError::UnknownRelatedType(ref name) if name == "Spaceship"));

    let err = User::query().on("posts.user_id = users.id").to_sql().unwrap_err();
    assert!(matches!(err, QuarryError::UnsupportedOperation(_)));
}

#[test]
fn test_skip_take_matches_range() {
    let rows = vec![user_row(3, "c"), user_row(4, "d")];
    let windowed = recording(vec![rows.clone()]);
    let ranged = recording(vec![rows]);

    let by_window = User::query()
        .with_connection(shared(&windowed))
        .skip(2)
        .take(2)
        .all()
        .unwrap();
    let by_range = User::query()
        .with_connection(shared(&ranged))
        .range(2, 2)
        .unwrap();

    assert_eq!(windowed.statements(), ranged.statements());
    assert_eq!(
        by_window.into_entities::<User>(),
        by_range.into_entities::<User>()
    );
    assert_eq!(
        windowed.executed_sql()[0],
        r#"SELECT * FROM "users" LIMIT 2 OFFSET 2"#
    );
}

#[test]
fn test_range_does_not_change_the_relation() {
    let conn = recording(vec![vec![], vec![]]);
    let relation = User::query().with_connection(shared(&conn));
    relation.range(5, 5).unwrap();
    relation.all().unwrap();
    assert_eq!(conn.executed_sql()[1], r#"SELECT * FROM "users""#);
}

#[test]
fn test_page() {
    let conn = recording(vec![vec![]]);
    User::query().with_connection(shared(&conn)).page(3, 10).unwrap();
    assert_eq!(
        conn.executed_sql()[0],
        r#"SELECT * FROM "users" LIMIT 10 OFFSET 20"#
    );
}

#[test]
fn test_page_past_addressable_offset_is_rejected() {
    let conn = recording(vec![vec![]]);
    let err = User::query()
        .with_connection(shared(&conn))
        .page(u64::MAX, 2)
        .unwrap_err();
    assert!(matches!(err, QuarryError::UnsupportedOperation(_)));
    assert_eq!(conn.round_trips(), 0);
}

#[test]
fn test_first_is_one_row_window() {
    let conn = recording(vec![vec![user_row(1, "Ann")]]);
    let first = User::query()
        .with_connection(shared(&conn))
        .order_by("id")
        .first()
        .unwrap()
        .unwrap();
    assert_eq!(first.into_entity::<User>().unwrap().name, "Ann");
    assert_eq!(
        conn.executed_sql()[0],
        r#"SELECT * FROM "users" ORDER BY "id" ASC LIMIT 1"#
    );
}

#[test]
fn test_named_ordinals_match_range() {
    let conn = recording(vec![vec![user_row(21, "u")], vec![user_row(21, "u")]]);
    let relation = User::query().with_connection(shared(&conn));

    let by_name = relation.ordinal("twenty-first").unwrap().unwrap();
    let by_range = relation.range(20, 1).unwrap().into_entities::<User>().unwrap();

    assert_eq!(by_name.into_entity::<User>().as_ref(), by_range.first());
    let statements = conn.statements();
    assert_eq!(statements[0], statements[1]);
    assert_eq!(
        conn.executed_sql()[0],
        r#"SELECT * FROM "users" LIMIT 1 OFFSET 20"#
    );
}

#[test]
fn test_generated_ordinals() {
    let conn = recording(vec![]);
    let relation = User::query().with_connection(shared(&conn));
    assert!(relation.third().unwrap().is_none());
    assert!(relation.tenth().unwrap().is_none());
    let sql = conn.executed_sql();
    assert_eq!(sql[0], r#"SELECT * FROM "users" LIMIT 1 OFFSET 2"#);
    assert_eq!(sql[1], r#"SELECT * FROM "users" LIMIT 1 OFFSET 9"#);
}

#[test]
fn test_unknown_ordinal_makes_no_round_trip() {
    let conn = recording(vec![]);
    let err = User::query()
        .with_connection(shared(&conn))
        .ordinal("hundredth")
        .unwrap_err();
    assert!(matches!(err, QuarryError::AttributeNotFound(name) if name == "hundredth"));
    assert_eq!(conn.round_trips(), 0);
}

#[test]
fn test_projection_returns_raw_rows() {
    let conn = recording(vec![vec![Row::new().with("name", "Ann")]]);
    let records = User::query()
        .with_connection(shared(&conn))
        .select(["name"])
        .all()
        .unwrap();
    assert!(!records.is_materialized());
    assert_eq!(records.rows().unwrap()[0].try_get::<String>("name").unwrap(), "Ann");
    assert_eq!(conn.executed_sql()[0], r#"SELECT "name" FROM "users""#);
}

#[test]
fn test_extra_column_returns_raw_rows() {
    let conn = recording(vec![vec![user_row(1, "Ann").with("title", "Hello")]]);
    let records = User::query()
        .with_connection(shared(&conn))
        .join("posts")
        .all()
        .unwrap();
    assert!(!records.is_materialized());
    assert_eq!(records.len(), 1);
}

#[test]
fn test_empty_result_is_empty_collection() {
    let conn = recording(vec![vec![]]);
    let records = User::query().with_connection(shared(&conn)).all().unwrap();
    assert!(records.is_empty());
}

#[test]
fn test_join_tree_expansion() {
    let sql = User::query()
        .join(JoinSpec::nested("posts", ["comments", "moderators"]))
        .to_sql()
        .unwrap();
    assert_eq!(
        sql,
        concat!(
            r#"SELECT * FROM "users""#,
            r#" INNER JOIN "posts" ON "posts"."user_id" = "users"."id""#,
            r#" INNER JOIN "comments" ON "comments"."post_id" = "posts"."id""#,
            r#" INNER JOIN "moderators" ON "moderators"."post_id" = "posts"."id""#,
        )
    );
}

#[test]
fn test_join_kinds() {
    let sql = User::query()
        .left_join("posts")
        .full_join("addresses")
        .to_sql()
        .unwrap();
    assert!(sql.contains(r#"LEFT JOIN "posts""#), "{sql}");
    assert!(sql.contains(r#"FULL OUTER JOIN "addresses""#), "{sql}");
}

#[test]
fn test_explicit_on_replaces_convention_then_ands() {
    let sql = User::query()
        .join("posts")
        .on("posts.author_id = users.id")
        .on("posts.published")
        .to_sql()
        .unwrap();
    assert!(sql.contains("posts.author_id = users.id"), "{sql}");
    assert!(sql.contains("AND"), "{sql}");
    assert!(sql.contains("posts.published"), "{sql}");
    assert!(!sql.contains("user_id"), "{sql}");
}

#[test]
fn test_exists_and_not_exists() {
    let posts = Post::query().where_raw("posts.user_id = users.id", Params::None);

    let with_posts = User::query().exists(posts.clone()).to_sql().unwrap();
    assert!(with_posts.contains("EXISTS"), "{with_posts}");
    assert!(!with_posts.contains("NOT"), "{with_posts}");

    let without_posts = User::query().not_exists(posts).to_sql().unwrap();
    assert!(without_posts.contains("NOT EXISTS"), "{without_posts}");
}

#[test]
fn test_group_by_and_alias() {
    let sql = User::query()
        .alias("u")
        .select(["u.name"])
        .group_by("u.name")
        .filter(Conditions::new().eq("name", "Ann"))
        .to_sql()
        .unwrap();
    assert_eq!(
        sql,
        r#"SELECT "u"."name" FROM "users" AS "u" WHERE "u"."name" = 'Ann' GROUP BY "u"."name""#
    );
}

#[test]
fn test_from_rebinds_entity() {
    let relation = User::query().from(Post::definition());
    assert!(relation.entity().is::<Post>());
    assert_eq!(relation.to_sql().unwrap(), r#"SELECT * FROM "posts""#);
}

#[test]
fn test_empty_insert_is_a_no_op() {
    let conn = RecordingConnection::new().shared();
    let relation = Relation::for_kind::<User, _>("insert")
        .unwrap()
        .with_connection(shared(&conn))
        .insert(Vec::<(&str, Value)>::new());
    assert!(relation.statement().assignments().is_empty());
    assert!(matches!(relation.execute().unwrap(), Executed::Affected(0)));
    assert_eq!(conn.round_trips(), 0);
}

#[test]
fn test_insert_update_delete() {
    let conn = RecordingConnection::new()
        .with_affected(1)
        .with_affected(2)
        .with_affected(3)
        .shared();

    let inserted = Relation::for_kind::<User, _>(2i64)
        .unwrap()
        .with_connection(shared(&conn))
        .insert([("userName", "Ann")])
        .execute()
        .unwrap();
    let updated = Relation::for_kind::<User, _>(3i64)
        .unwrap()
        .with_connection(shared(&conn))
        .set([("name", "Bo")])
        .filter(Conditions::new().eq("id", 1))
        .execute()
        .unwrap();
    let deleted = Relation::for_kind::<User, _>(4i64)
        .unwrap()
        .with_connection(shared(&conn))
        .delete(Conditions::new().any("id", [1, 2, 3]))
        .execute()
        .unwrap();

    assert_eq!(inserted.affected(), Some(1));
    assert_eq!(updated.affected(), Some(2));
    assert_eq!(deleted.affected(), Some(3));
    assert_eq!(
        conn.executed_sql(),
        vec![
            r#"INSERT INTO "users" ("user_name") VALUES ('Ann')"#.to_string(),
            r#"UPDATE "users" SET "name" = 'Bo' WHERE "id" = 1"#.to_string(),
            r#"DELETE FROM "users" WHERE "id" IN (1, 2, 3)"#.to_string(),
        ]
    );
}

#[test]
fn test_all_on_delete_relation_is_rejected() {
    let conn = RecordingConnection::new().with_affected(1).shared();
    let err = Relation::for_kind::<Post, _>("delete")
        .unwrap()
        .with_connection(shared(&conn))
        .all()
        .unwrap_err();
    assert!(matches!(err, QuarryError::UnsupportedOperation(_)));
    assert_eq!(conn.round_trips(), 0);
}

#[test]
fn test_unknown_operation() {
    assert!(matches!(
        Relation::for_kind::<User, _>("merge"),
        Err(QuarryError::UnsupportedOperation(_))
    ));
    assert!(matches!(
        Relation::for_kind::<User, _>(0i64),
        Err(QuarryError::UnsupportedOperation(_))
    ));
}

#[test]
fn test_record_field_access() {
    let conn = recording(vec![vec![post_row(7, 1, "Hello")]]);
    let record = Post::query()
        .with_connection(shared(&conn))
        .first()
        .unwrap()
        .unwrap();
    assert_eq!(record.get("title"), Some(Value::from("Hello")));
    assert_eq!(record.as_entity::<Post>().map(|p| p.id), Some(7));
}
