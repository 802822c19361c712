//! Shared test fixtures: an in-memory fake REST server implementing the
//! transport seam, plus the blog resource configurations used across the
//! integration suites.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{Value, json};

use reflectstore::{
    ApiConfig, Field, Method, Record, ResourceConfig, Result, Store, Transport,
    TransportResponse,
};

type Table = BTreeMap<i64, Record>;

struct Db {
    posts: Table,
    authors: Table,
    profile: Record,
}

fn record(value: Value) -> Record {
    value.as_object().cloned().unwrap()
}

fn seeded() -> Db {
    let mut posts = Table::new();
    posts.insert(
        1,
        record(json!({
            "title": "Foo",
            "body": "foo bar baz",
            "author": {"id": 1, "name": "Jane Doe", "email": "jane@doe.com"},
        })),
    );
    posts.insert(
        2,
        record(json!({
            "title": "Bar",
            "body": "bar baz",
            "author": {"id": 1, "name": "Jane Doe", "email": "jane@doe.com"},
        })),
    );

    let mut authors = Table::new();
    authors.insert(1, record(json!({"name": "Jane Doe", "email": "jane@doe.com"})));
    authors.insert(2, record(json!({"name": "John Doe", "email": "john@doe.com"})));

    Db {
        posts,
        authors,
        profile: record(json!({"username": "admin"})),
    }
}

/// Fake REST server for the blog fixtures. Collection endpoints handle
/// GET/POST, model endpoints GET/PUT/DELETE, and `/profile` acts as a
/// singleton resource.
pub struct MockServer {
    db: Mutex<Db>,
}

impl MockServer {
    pub fn new() -> Self {
        Self {
            db: Mutex::new(seeded()),
        }
    }
}

fn indexed(id: i64, data: &Record) -> Value {
    let mut out = Record::new();
    out.insert("id".to_string(), json!(id));
    out.extend(data.clone());
    Value::Object(out)
}

fn not_found(url: &str) -> TransportResponse {
    TransportResponse::new(404, json!({"message": format!("URL {url} not in API")}))
}

fn collection(table: &mut Table, method: Method, payload: Option<Value>) -> TransportResponse {
    match method {
        Method::Get => TransportResponse::new(
            200,
            Value::Array(table.iter().map(|(id, data)| indexed(*id, data)).collect()),
        ),
        Method::Post => {
            let id = table.keys().max().copied().unwrap_or(0) + 1;
            let data = payload
                .and_then(|p| p.as_object().cloned())
                .unwrap_or_default();
            table.insert(id, data);
            TransportResponse::new(201, indexed(id, &table[&id]))
        }
        _ => TransportResponse::new(404, Value::Null),
    }
}

fn model(
    table: &mut Table,
    id: i64,
    method: Method,
    payload: Option<Value>,
    url: &str,
) -> TransportResponse {
    match method {
        Method::Get => match table.get(&id) {
            Some(data) => TransportResponse::new(200, indexed(id, data)),
            None => not_found(url),
        },
        Method::Put => match table.get_mut(&id) {
            Some(data) => {
                if let Some(Value::Object(update)) = payload {
                    for (key, value) in update {
                        if key != "id" {
                            data.insert(key, value);
                        }
                    }
                }
                let snapshot = data.clone();
                TransportResponse::new(200, indexed(id, &snapshot))
            }
            None => not_found(url),
        },
        Method::Delete => {
            table.remove(&id);
            TransportResponse::new(204, Value::Null)
        }
        _ => not_found(url),
    }
}

#[async_trait]
impl Transport for MockServer {
    async fn call(
        &self,
        method: Method,
        url: &str,
        payload: Option<Value>,
    ) -> Result<TransportResponse> {
        let mut db = self.db.lock().unwrap();

        let path = url.split('?').next().unwrap_or(url);
        let segments: Vec<&str> = path.trim_matches('/').split('/').collect();

        let response = match segments.as_slice() {
            ["posts"] => collection(&mut db.posts, method, payload),
            ["posts", "latest"] => match db.posts.iter().next_back() {
                Some((id, data)) => TransportResponse::new(200, indexed(*id, data)),
                None => not_found(url),
            },
            ["authors"] => collection(&mut db.authors, method, payload),
            ["posts", id] => match id.parse::<i64>() {
                Ok(id) => model(&mut db.posts, id, method, payload, url),
                Err(_) => not_found(url),
            },
            ["authors", id] => match id.parse::<i64>() {
                Ok(id) => model(&mut db.authors, id, method, payload, url),
                Err(_) => not_found(url),
            },
            ["profile"] => match method {
                Method::Get => TransportResponse::new(200, Value::Object(db.profile.clone())),
                Method::Put => {
                    if let Some(Value::Object(update)) = payload {
                        db.profile.extend(update);
                    }
                    TransportResponse::new(200, Value::Object(db.profile.clone()))
                }
                Method::Delete => {
                    db.profile = Record::new();
                    TransportResponse::new(204, Value::Null)
                }
                Method::Post => not_found(url),
            },
            _ => not_found(url),
        };

        Ok(response)
    }
}

fn is_email(value: &Value) -> bool {
    value
        .as_str()
        .is_some_and(|s| s.contains('@') && s.rsplit('@').next().is_some_and(|d| d.contains('.')))
}

pub fn posts_config() -> ResourceConfig {
    ResourceConfig::new("posts")
        .api(ApiConfig::new().collection("/posts").model("/posts/:id"))
        .action("latest", "/posts/latest", Method::Get)
        .field("title", Field::new().default_value("My Post Title").required())
        .field(
            "body",
            Field::new().mutate(|v| json!(format!("<div>{}</div>", v.as_str().unwrap_or("")))),
        )
        .field(
            "author",
            Field::new()
                .relation("authors")
                .collapse("id")
                .parse(|v| match &v {
                    Value::Object(nested) => nested.get("id").cloned().unwrap_or(v),
                    _ => v,
                }),
        )
}

pub fn authors_config() -> ResourceConfig {
    ResourceConfig::new("authors")
        .api(
            ApiConfig::new()
                .fetch("/authors")
                .create("/authors")
                .get("/authors/:id")
                .update("/authors/:id")
                .delete("/authors/:id"),
        )
        .field("name", Field::new().default_value(json!(null)).required())
        .field(
            "email",
            Field::new()
                .default_value(json!(null))
                .validate(is_email, "`${value}` is not a valid email."),
        )
}

pub fn profile_config() -> ResourceConfig {
    ResourceConfig::new("profile")
        .singleton()
        .api(
            ApiConfig::new()
                .fetch("/profile")
                .update("/profile")
                .delete("/profile"),
        )
        .field("username", Field::new().default_value("<anonymous>"))
}

/// Store wired to a fresh mock server with the full blog fixture set.
pub fn blog_store() -> (Store, Arc<MockServer>) {
    let server = Arc::new(MockServer::new());
    let store = Store::builder()
        .transport(Arc::clone(&server) as Arc<dyn Transport>)
        .resource(posts_config())
        .resource(authors_config())
        .resource(profile_config())
        .build()
        .unwrap();
    (store, server)
}
