use serde_json::{Map, Value};

#[derive(Debug, Clone, PartialEq)]
pub struct Blackboard {
    context: Map<String, Value>,
}

impl Blackboard {
    pub fn new(input_context: Option<&Map<String, Value>>) -> Self {
        let trigger = Map::from_iter([(
            "input".to_string(),
            Value::Object(input_context.cloned().unwrap_or_default()),
        )]);
        let context = Map::from_iter([
            ("trigger".to_string(), Value::Object(trigger)),
            ("steps".to_string(), Value::Object(Map::new())),
        ]);
        Self { context }
    }

    pub fn context(&self) -> &Map<String, Value> {
        &self.context
    }

    pub fn value(&self) -> Value {
        Value::Object(self.context.clone())
    }

    // `steps` entries are write-once; a duplicate step id never overwrites
    // an earlier output.
    pub fn record_step_output(&mut self, step_id: &str, output: Map<String, Value>) {
        if let Some(Value::Object(steps)) = self.context.get_mut("steps") {
            steps
                .entry(step_id.to_string())
                .or_insert(Value::Object(output));
        }
    }

    pub fn resolve(&self, template: &str) -> String {
        resolve_template(template, &self.context)
    }
}

pub fn resolve_template(template: &str, context: &Map<String, Value>) -> String {
    let mut rendered = String::new();
    let mut cursor = template;

    while let Some(start) = cursor.find("${") {
        let after_open = &cursor[start + 2..];
        let Some(close) = after_open.find('}') else {
            // Unterminated reference: the remainder passes through verbatim.
            rendered.push_str(cursor);
            return rendered;
        };
        rendered.push_str(&cursor[..start]);
        let token = &after_open[..close];
        match lookup_path(context, token) {
            Some(value) => rendered.push_str(&render_value(value)),
            None => {
                rendered.push_str("${");
                rendered.push_str(token);
                rendered.push('}');
            }
        }
        cursor = &after_open[close + 1..];
    }

    rendered.push_str(cursor);
    rendered
}

fn lookup_path<'a>(context: &'a Map<String, Value>, path: &str) -> Option<&'a Value> {
    let mut segments = path.split('.');
    let mut current = context.get(segments.next()?)?;
    for segment in segments {
        current = current.as_object()?.get(segment)?;
    }
    Some(current)
}

fn render_value(value: &Value) -> String {
    if let Some(text) = value.as_str() {
        return text.to_string();
    }
    serde_json::to_string(value).unwrap_or_default()
}
