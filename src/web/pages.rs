// SPDX-License-Identifier: MIT
//! Server-rendered HTML pages.
//!
//! Pages are assembled from string literals — no template engine. All
//! user-supplied text goes through [`escape_html`] before it reaches a page.

use crate::flash::FlashMessage;
use crate::tasks::TaskRow;

/// Escape text for safe interpolation into HTML body or attribute positions.
pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

const STYLE: &str = r#"
    body { font-family: system-ui, sans-serif; max-width: 44rem; margin: 2rem auto; padding: 0 1rem; color: #1a1a1a; }
    h1 { font-size: 1.4rem; }
    form { display: inline; }
    ul.tasks { list-style: none; padding: 0; }
    ul.tasks li { display: flex; align-items: baseline; gap: .5rem; padding: .4rem 0; border-bottom: 1px solid #eee; }
    .task-name.done { text-decoration: line-through; color: #888; }
    .due { color: #666; font-size: .85rem; }
    .flash { padding: .5rem .75rem; border-radius: 4px; margin: .25rem 0; }
    .flash.success { background: #e6f4ea; color: #1e7e34; }
    .flash.error { background: #fdecea; color: #b02a37; }
    .flash.danger { background: #fff3cd; color: #856404; }
    .toolbar { margin: 1rem 0; display: flex; gap: 1rem; align-items: center; }
    button, input[type=submit] { cursor: pointer; }
"#;

fn layout(title: &str, body: &str) -> String {
    format!(
        r#"<!doctype html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <meta name="viewport" content="width=device-width, initial-scale=1.0">
  <title>{title}</title>
  <style>{STYLE}</style>
</head>
<body>
{body}
</body>
</html>
"#
    )
}

fn flash_block(flashes: &[FlashMessage]) -> String {
    let mut out = String::new();
    for flash in flashes {
        out.push_str(&format!(
            "<div class=\"flash {}\">{}</div>\n",
            flash.category,
            escape_html(&flash.text)
        ));
    }
    out
}

fn task_item(task: &TaskRow) -> String {
    let id = task.id;
    let name = escape_html(&task.name);
    let due = escape_html(&task.due_date);
    let name_class = if task.complete {
        "task-name done"
    } else {
        "task-name"
    };
    let toggle_label = if task.complete { "Reopen" } else { "Done" };
    let toggle_value = !task.complete;

    let attachment = match &task.file_name {
        Some(file_name) => format!(
            "<a href=\"/download/{id}\">{}</a>",
            escape_html(file_name)
        ),
        None => String::new(),
    };

    format!(
        r#"  <li>
    <span class="{name_class}">{name}</span>
    <span class="due">due {due}</span>
    <form method="post" action="/complete/{id}">
      <input type="hidden" name="complete" value="{toggle_value}">
      <button type="submit">{toggle_label}</button>
    </form>
    <a href="/edit/{id}">Edit</a>
    <a href="/delete/{id}">Delete</a>
    <form method="post" action="/upload/{id}" enctype="multipart/form-data">
      <input type="file" name="file" required>
      <button type="submit">Attach</button>
    </form>
    {attachment}
  </li>
"#
    )
}

/// The list view: flash area, add form, filter toggle, task rows, count.
pub fn index_page(tasks: &[TaskRow], flashes: &[FlashMessage], show_incomplete: bool) -> String {
    let flash_html = flash_block(flashes);

    let filter_link = if show_incomplete {
        r#"<a href="/">Show all tasks</a>"#
    } else {
        r#"<a href="/?incomplete=true">Hide completed tasks</a>"#
    };

    let items = if tasks.is_empty() {
        "  <li><em>No tasks yet.</em></li>\n".to_string()
    } else {
        tasks.iter().map(task_item).collect()
    };

    let count = tasks.len();
    let body = format!(
        r#"<h1>Task List</h1>
{flash_html}<form method="post" action="/add">
  <input type="text" name="task" placeholder="New task" required>
  <input type="date" name="due_date" required>
  <button type="submit">Add task</button>
</form>
<div class="toolbar">
  {filter_link}
  <span>{count} task(s)</span>
  <form method="post" action="/delete_all" onsubmit="return confirm('Delete all tasks?')">
    <button type="submit">Delete all</button>
  </form>
  <a href="/logout">Log out</a>
</div>
<ul class="tasks">
{items}</ul>
"#
    );
    layout("Task List", &body)
}

/// The edit form for one task.
pub fn edit_page(task: &TaskRow) -> String {
    let id = task.id;
    let name = escape_html(&task.name);
    let due = escape_html(&task.due_date);
    let body = format!(
        r#"<h1>Edit Task</h1>
<form method="post" action="/edit/{id}">
  <input type="text" name="task" value="{name}" required>
  <input type="date" name="due_date" value="{due}">
  <button type="submit">Save</button>
</form>
<p><a href="/">Back to list</a></p>
"#
    );
    layout("Edit Task", &body)
}
