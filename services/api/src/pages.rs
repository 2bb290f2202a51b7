//! HTML Pages
//!
//! Server-rendered pages for both tracks. The voice page only renders the
//! current state and polls `/api/state`; all navigation happens in the voice
//! session or through `/api/navigate`.

use axum::{
    extract::{Path, Query, State},
    response::{Html, IntoResponse, Redirect, Response},
};
use ammonia::clean_text;
use clearpath_core::{Catalog, Topic, is_affirmative};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use std::{fmt::Write, sync::Arc};
use tracing::info;

use crate::{handlers::ApiError, models::TopicQuery, state::AppState};

/// Unreserved URL characters stay as they are.
const PATH_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

pub const GREETING_QUESTION: &str = "Are you visually impaired? Please say yes or no.";

const STYLE: &str = "body{font-family:sans-serif;font-size:1.25rem;max-width:48rem;margin:2rem auto;line-height:1.5}\
a,button{font-size:1.25rem;margin-right:1rem}";

const POLL_SCRIPT: &str = r#"<script>
async function refresh() {
  const res = await fetch('/api/state');
  if (!res.ok) return;
  const s = await res.json();
  if (!s.course) {
    document.getElementById('course').textContent = 'No course selected';
    document.getElementById('position').textContent = '';
    document.getElementById('title').textContent = 'Please select a course';
    document.getElementById('example').textContent = '';
    return;
  }
  document.getElementById('course').textContent = s.course;
  document.getElementById('position').textContent = `Topic ${s.index + 1} of ${s.total}`;
  document.getElementById('title').textContent = s.content.title;
  document.getElementById('summary').textContent = s.content.summary;
  document.getElementById('example').textContent = s.content.example;
}
async function send(command) {
  await fetch('/api/navigate', {
    method: 'POST',
    headers: {'Content-Type': 'application/json'},
    body: JSON.stringify({command}),
  });
  refresh();
}
setInterval(refresh, 1000);
refresh();
</script>"#;

/// Entry point offering the two tracks, optionally asking out loud first.
pub async fn index(State(state): State<Arc<AppState>>) -> Response {
    if state.config.voice_greeting {
        let answer = state.speech.listen(GREETING_QUESTION).await;
        if is_affirmative(&answer) {
            info!("Learner answered yes to the greeting, opening the voice track");
            return Redirect::to("/visually").into_response();
        }
    }
    Html(layout(
        "Welcome",
        "<h1>Welcome</h1>\
         <p>Choose how you would like to learn.</p>\
         <ul>\
         <li><a href=\"/visually\">Voice navigation for visually impaired learners</a></li>\
         <li><a href=\"/hearing\">Captioned videos for hearing impaired learners</a></li>\
         </ul>",
    ))
    .into_response()
}

/// Voice track: starts a fresh voice session and renders the polling page.
pub async fn visually(State(state): State<Arc<AppState>>) -> Html<String> {
    state.sessions.start().await;
    let prompt = format!(
        "Use voice to select {} to begin.",
        state.visual_catalog.spoken_course_list()
    );

    let mut body = String::from("<h1>Voice Courses</h1><p>Available courses:</p><ul>");
    for name in state.visual_catalog.course_names() {
        let _ = write!(body, "<li>{}</li>", clean_text(name));
    }
    body.push_str("</ul>");
    let _ = write!(
        body,
        "<main aria-live=\"polite\">\
         <h2 id=\"course\">No course selected</h2>\
         <p id=\"position\"></p>\
         <h3 id=\"title\">Please select a course</h3>\
         <p id=\"summary\">{}</p>\
         <pre id=\"example\"></pre>\
         </main>\
         <nav>\
         <button onclick=\"send('previous')\">Previous</button>\
         <button onclick=\"send('repeat')\">Repeat</button>\
         <button onclick=\"send('next')\">Next</button>\
         <button onclick=\"send('stop')\">Stop</button>\
         </nav>{}",
        clean_text(&prompt),
        POLL_SCRIPT,
    );
    Html(layout("Voice Courses", &body))
}

pub async fn hearing_index(State(state): State<Arc<AppState>>) -> Html<String> {
    let mut body = String::from("<h1>Captioned Courses</h1><ul>");
    for name in state.hearing_catalog.course_names() {
        let _ = write!(
            body,
            "<li><a href=\"{}\">{}</a></li>",
            course_href(name, 0),
            clean_text(name)
        );
    }
    body.push_str("</ul>");
    Html(layout("Captioned Courses", &body))
}

/// One captioned topic: the video with its summary as caption text.
pub async fn hearing_course(
    State(state): State<Arc<AppState>>,
    Path(course_name): Path<String>,
    Query(query): Query<TopicQuery>,
) -> Result<Html<String>, ApiError> {
    let index = query.topic_index;
    let topic = state
        .hearing_catalog
        .topic(&course_name, index)
        .ok_or_else(|| ApiError::NotFound("Topic not found".to_string()))?;
    Ok(Html(topic_page(
        &state.hearing_catalog,
        &course_name,
        index,
        topic,
    )))
}

fn topic_page(catalog: &Catalog, course_name: &str, index: usize, topic: &Topic) -> String {
    let total = catalog.get_topics(course_name).len();
    let mut body = format!(
        "<p><a href=\"/hearing\">All courses</a></p>\
         <h1>{course}</h1>\
         <h2>{title}</h2>\
         <p>Topic {position} of {total}</p>\
         <video controls width=\"640\" src=\"/video/{course_segment}/{index}\"></video>\
         <p class=\"caption\">{summary}</p>",
        course = clean_text(course_name),
        title = clean_text(&topic.title),
        position = index + 1,
        course_segment = encode_segment(course_name),
        summary = clean_text(&topic.summary),
    );
    if topic.has_example() {
        let _ = write!(body, "<pre>{}</pre>", clean_text(&topic.example));
    }
    body.push_str("<nav>");
    if index > 0 {
        let _ = write!(
            body,
            "<a href=\"{}\">Previous</a>",
            course_href(course_name, index - 1)
        );
    }
    if index + 1 < total {
        let _ = write!(
            body,
            "<a href=\"{}\">Next</a>",
            course_href(course_name, index + 1)
        );
    }
    body.push_str("</nav>");
    layout(&topic.title, &body)
}

fn layout(title: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html><html lang=\"en\"><head><meta charset=\"utf-8\">\
         <title>{}</title><style>{STYLE}</style></head><body>{body}</body></html>",
        clean_text(title)
    )
}

fn course_href(course_name: &str, index: usize) -> String {
    format!(
        "/hearing/course/{}?topic_index={index}",
        encode_segment(course_name)
    )
}

/// Percent-encodes a course name for use as a single path segment.
fn encode_segment(segment: &str) -> String {
    utf8_percent_encode(segment, PATH_SEGMENT).to_string()
}
