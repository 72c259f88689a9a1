//! Entities shared by the integration tests.
#![allow(dead_code)]

use quarry::test_helpers::RecordingConnection;
use quarry::{Entity, Model, Records, Result, Row};
use sea_query::Value;
use std::sync::Arc;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub posts: Vec<Post>,
}

impl Model for User {
    fn fill_attributes(&mut self, row: &Row) -> Result<()> {
        self.id = row.try_get("id")?;
        self.name = row.try_get("name")?;
        Ok(())
    }

    fn attribute(&self, name: &str) -> Option<Value> {
        match name {
            "id" => Some(self.id.into()),
            "name" => Some(self.name.clone().into()),
            _ => None,
        }
    }

    fn attach(&mut self, key: &str, records: Records) {
        if key == "posts" {
            self.posts = records.into_entities::<Post>().unwrap_or_default();
        }
    }
}

impl Entity for User {
    fn attributes() -> &'static [&'static str] {
        &["id", "name"]
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Post {
    pub id: i64,
    pub user_id: i64,
    pub title: String,
}

impl Model for Post {
    fn fill_attributes(&mut self, row: &Row) -> Result<()> {
        self.id = row.try_get("id")?;
        self.user_id = row.try_get("user_id")?;
        self.title = row.try_get("title")?;
        Ok(())
    }

    fn attribute(&self, name: &str) -> Option<Value> {
        match name {
            "id" => Some(self.id.into()),
            "user_id" => Some(self.user_id.into()),
            "title" => Some(self.title.clone().into()),
            _ => None,
        }
    }
}

impl Entity for Post {
    fn attributes() -> &'static [&'static str] {
        &["id", "user_id", "title"]
    }
}

pub fn user_row(id: i64, name: &str) -> Row {
    Row::new().with("id", id).with("name", name)
}

pub fn post_row(id: i64, user_id: i64, title: &str) -> Row {
    Row::new()
        .with("id", id)
        .with("user_id", user_id)
        .with("title", title)
}

pub fn recording(outcomes: Vec<Vec<Row>>) -> Arc<RecordingConnection> {
    outcomes
        .into_iter()
        .fold(RecordingConnection::new(), |conn, rows| conn.with_rows(rows))
        .shared()
}
