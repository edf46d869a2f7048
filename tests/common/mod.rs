//! Scripted transport and response fixtures.

#![allow(dead_code)]

use std::{collections::VecDeque, sync::Mutex};

use http::StatusCode;
use serde_json::{json, Value};
use tokio::time::Instant;

use vkaudio::{
    audio::VkAudio,
    error::{Error, Result},
    http::{Form, Response, Transport},
};

pub const USER_ID: i64 = 1_000;

/// One request as seen by [`MockTransport`].
#[derive(Clone, Debug)]
pub struct Call {
    pub method: &'static str,
    pub url: String,
    pub form: Form,
    pub allow_redirects: bool,
    pub at: Instant,
}

impl Call {
    /// Value of form field or query parameter `name`.
    pub fn field(&self, name: &str) -> Option<&str> {
        self.form
            .iter()
            .find(|(key, _)| *key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn is_reload(&self) -> bool {
        self.field("act") == Some("reload_audio")
    }
}

/// Answers requests with scripted bodies, in order.
#[derive(Default)]
pub struct MockTransport {
    responses: Mutex<VecDeque<String>>,
    calls: Mutex<Vec<Call>>,
}

impl MockTransport {
    pub fn new<I, S>(bodies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            responses: Mutex::new(bodies.into_iter().map(Into::into).collect()),
            calls: Mutex::default(),
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn reloads(&self) -> Vec<Call> {
        self.calls().into_iter().filter(Call::is_reload).collect()
    }

    pub fn remaining(&self) -> usize {
        self.responses.lock().unwrap().len()
    }

    fn respond(
        &self,
        method: &'static str,
        url: &str,
        form: Form,
        allow_redirects: bool,
    ) -> Result<Response> {
        self.calls.lock().unwrap().push(Call {
            method,
            url: url.to_owned(),
            form,
            allow_redirects,
            at: Instant::now(),
        });

        let body = self
            .responses
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| Error::not_found(format!("no response scripted for {method} {url}")))?;

        Ok(Response::new(url, StatusCode::OK, body))
    }
}

impl Transport for MockTransport {
    async fn get(&self, url: &str, query: Form, allow_redirects: bool) -> Result<Response> {
        self.respond("GET", url, query, allow_redirects)
    }

    async fn post(&self, url: &str, form: Form, allow_redirects: bool) -> Result<Response> {
        self.respond("POST", url, form, allow_redirects)
    }
}

pub fn vk<I, S>(bodies: I) -> VkAudio<MockTransport>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    VkAudio::new(MockTransport::new(bodies), USER_ID, true)
}

/// An audio tuple with a complete identity and search context `context`.
pub fn tuple_in(owner_id: i64, id: i64, context: &str) -> Value {
    json!([
        id,
        owner_id,
        "",
        format!("Title {id} "),
        "Artist &amp; Co",
        180,
        0,
        0,
        "",
        "",
        0,
        context,
        "",
        format!("x/y/h2{id}/z/w/h5{id}/"),
        format!("https://img.example/{id}.jpg")
    ])
}

pub fn tuple(owner_id: i64, id: i64) -> Value {
    tuple_in(owner_id, id, "")
}

/// A tuple whose hashes lack the second token.
pub fn tuple_without_identity(owner_id: i64, id: i64) -> Value {
    let mut tuple = tuple(owner_id, id);
    tuple[13] = json!("x/y/h2/z/w//");
    tuple
}

pub fn tuples(ids: std::ops::Range<i64>) -> Vec<Value> {
    ids.map(|id| tuple(-1, id)).collect()
}

pub fn tuples_in(ids: std::ops::Range<i64>, context: &str) -> Vec<Value> {
    ids.map(|id| tuple_in(-1, id, context)).collect()
}

/// Body of `act=load_section`.
pub fn load_section(list: &[Value], has_more: bool) -> String {
    json!({"data": [{"list": list, "hasMore": has_more}]}).to_string()
}

/// Body of `act=reload_audio` resolving `ids`.
pub fn reload(ids: std::ops::Range<i64>) -> String {
    let resolved: Vec<Value> = ids
        .map(|id| {
            let mut tuple = tuple(-1, id);
            tuple[2] = json!(format!("https://cs1.vkuseraudio.net/p1/{id}.mp3"));
            tuple
        })
        .collect();
    json!({"data": [resolved]}).to_string()
}

/// Body of `act=reload_audio` resolving one track to `url`.
pub fn reload_url(id: i64, url: &str) -> String {
    let mut tuple = tuple(-1, id);
    tuple[2] = json!(url);
    json!({"data": [[tuple]]}).to_string()
}

/// Body of an `al_audio.php` catalog section.
pub fn section(section: &Value) -> String {
    format!("<!--{}", json!({"payload": [0, ["", section]]}))
}

pub fn search_playlist(list: &[Value]) -> Value {
    json!({"type": "search", "list": list})
}

/// Desktop audio page embedding a recommendations section.
pub fn audio_page(list: &[Value], section_id: &str, next_from: &str) -> String {
    let data = json!({
        "sectionData": {
            "recoms": {
                "playlist": {"list": list},
                "sectionId": section_id,
                "nextFrom": next_from,
            }
        }
    });
    format!("<html><script>new AudioPage(ge('content'), {data}, 0);</script></html>")
}

/// HTML attribute value of a tuple.
pub fn data_audio(tuple: &Value) -> String {
    tuple.to_string().replace('"', "&quot;")
}
