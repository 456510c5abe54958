use pg_compose::{Fragment, Literal, SqlArg, ident, idents, items, items_with, literal};

#[test]
fn select_with_identifier_and_parameter() {
    let frag = Fragment::template(
        &["select ", " from ", " where id = ", ""],
        vec![
            SqlArg::from(idents(&["id", "name"])),
            SqlArg::from(ident("users")),
            SqlArg::from(42i64),
        ],
    )
    .unwrap();

    assert_eq!(
        frag.render(),
        r#"select "id", "name" from "users" where id = 42"#
    );

    let query = frag.to_query();
    assert_eq!(
        query.text,
        r#"select "id", "name" from "users" where id = $1"#
    );
    assert_eq!(query.params, vec![Literal::Int(42)]);
}

#[test]
fn insert_values_from_items() {
    let rows = items_with(
        vec![
            SqlArg::from(
                Fragment::template(&["(", ", ", ")"], vec![SqlArg::from(1i64), SqlArg::from("a")])
                    .unwrap(),
            ),
            SqlArg::from(
                Fragment::template(&["(", ", ", ")"], vec![SqlArg::from(2i64), SqlArg::from("b")])
                    .unwrap(),
            ),
        ],
        ", ",
    );
    let frag = Fragment::template(
        &["insert into ", " (id, name) values ", ""],
        vec![SqlArg::from(ident("t")), SqlArg::from(rows)],
    )
    .unwrap();

    // Sub-fragments were composed through a literal-rendering boundary, so
    // their values are inline; the statement carries no parameters.
    let query = frag.to_query();
    assert_eq!(
        query.text,
        r#"insert into "t" (id, name) values (1, 'a'), (2, 'b')"#
    );
    assert!(query.params.is_empty());
}

#[test]
fn in_list_mixes_placeholders_and_safe_text() {
    let frag = Fragment::template(
        &["delete from ", " where sku in (", ")"],
        vec![
            SqlArg::from(ident("stock")),
            SqlArg::from(items(vec![
                SqlArg::from("A-1"),
                SqlArg::from("B-2"),
                SqlArg::from(literal("C-3")),
            ])),
        ],
    )
    .unwrap();

    // `items` was passed as a nested fragment, so the whole list is inline.
    assert_eq!(
        frag.render(),
        r#"delete from "stock" where sku in ('A-1', 'B-2', 'C-3')"#
    );
}

#[test]
fn top_level_items_parameterize() {
    let frag = items(vec![SqlArg::from("x"), SqlArg::from(9i64)]);
    let query = frag.to_query();
    assert_eq!(query.text, "$1, $2");
    assert_eq!(
        query.params,
        vec![Literal::Text("x".into()), Literal::Int(9)]
    );
}

#[test]
fn adversarial_text_stays_inert() {
    let evil = "'; drop table users; --";
    let frag = Fragment::template(
        &["select * from t where name = ", ""],
        vec![SqlArg::from(evil)],
    )
    .unwrap();
    // Literal mode quotes it; query mode binds it.
    assert_eq!(
        frag.render(),
        "select * from t where name = '''; drop table users; --'"
    );
    let query = frag.to_query();
    assert_eq!(query.text, "select * from t where name = $1");
    assert_eq!(query.params, vec![Literal::Text(evil.into())]);
}
