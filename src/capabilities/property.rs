use super::{nothing, text, ArgError, Args, Capabilities};
use libewmh::PropertyValue;
use mlua::{Lua, MultiValue, Value};

/// Value a script wants to store in a window property
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyArg {
    Text(String),
    Number(f64),
    Boolean(bool),
}

impl PropertyArg {
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) => Some(PropertyArg::Text(s.to_string_lossy().to_string())),
            Value::Integer(n) => Some(PropertyArg::Number(*n as f64)),
            Value::Number(n) => Some(PropertyArg::Number(*n)),
            Value::Boolean(b) => Some(PropertyArg::Boolean(*b)),
            _ => None,
        }
    }

    /// Text becomes a Latin-1 string property, numbers and booleans a 32 bit cardinal
    pub fn encode(&self) -> PropertyValue {
        match self {
            PropertyArg::Text(s) => PropertyValue::Latin1(s.clone()),
            PropertyArg::Number(n) => PropertyValue::Cardinal(*n as i32 as u32),
            PropertyArg::Boolean(b) => PropertyValue::Cardinal(*b as u32),
        }
    }
}

/// Text of the named property, empty when absent
pub fn get_window_property(caps: &Capabilities, lua: &Lua, args: Args) -> mlua::Result<MultiValue> {
    args.exactly(1, ArgError::OneExpected)?;
    let name = args.string(0)?;
    let value = caps.window().and_then(|win| caps.wm.property(win, &name)).unwrap_or_default();
    text(lua, &value)
}

pub fn set_window_property(caps: &Capabilities, _: &Lua, args: Args) -> mlua::Result<MultiValue> {
    args.exactly(2, ArgError::TwoExpected)?;
    let name = args.string(0)?;
    let value = args.value(1).and_then(PropertyArg::from_value).ok_or_else(|| args.fail(ArgError::TwoExpected))?;
    if let Some(win) = caps.target() {
        caps.report("set_window_property", caps.wm.set_property(win, &name, &value.encode()));
    }
    nothing()
}

pub fn delete_window_property(caps: &Capabilities, _: &Lua, args: Args) -> mlua::Result<MultiValue> {
    args.exactly(1, ArgError::OneExpected)?;
    let name = args.string(0)?;
    if let Some(win) = caps.target() {
        caps.report("delete_window_property", caps.wm.delete_property(win, &name));
    }
    nothing()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::fake::{FakeWindow, FakeWindowSystem, Request};
    use crate::capabilities::testing::Harness;
    use crate::config::Mode;

    #[test]
    fn test_encode() {
        assert_eq!(PropertyArg::Text("x".to_owned()).encode(), PropertyValue::Latin1("x".to_owned()));
        assert_eq!(PropertyArg::Number(7.9).encode(), PropertyValue::Cardinal(7));
        assert_eq!(PropertyArg::Number(-1.0).encode(), PropertyValue::Cardinal(u32::MAX));
        assert_eq!(PropertyArg::Boolean(true).encode(), PropertyValue::Cardinal(1));
        assert_eq!(PropertyArg::from_value(&Value::Nil), None);
    }

    #[test]
    fn test_property_round_trip() {
        let h = Harness::new(FakeWindowSystem::new().with_window(1, FakeWindow::named("a")), Mode::default());
        assert_eq!(h.eval::<String>("return get_window_property('_MY_TAG')").unwrap(), "");

        let _guard = h.ctx.enter(Some(1));
        h.exec("set_window_property('_MY_TAG', 'work') set_window_property('_MY_FLAG', true)").unwrap();
        assert_eq!(h.eval::<String>("return get_window_property('_MY_TAG')").unwrap(), "work");
        assert_eq!(
            h.fake.requests().last(),
            Some(&Request::SetProperty(1, "_MY_FLAG".to_owned(), PropertyValue::Cardinal(1)))
        );

        // Numbers are stored as CARDINAL, which doesn't read back as text
        assert_eq!(h.eval::<String>("return get_window_property('_MY_FLAG')").unwrap(), "");
        h.exec("set_window_property('_MY_TAG', 'again') set_window_property('_MY_TAG', 7)").unwrap();
        assert_eq!(h.eval::<String>("return get_window_property('_MY_TAG')").unwrap(), "");
        h.exec("set_window_property('_MY_TAG', 'work')").unwrap();

        h.exec("delete_window_property('_MY_TAG')").unwrap();
        assert_eq!(h.eval::<String>("return get_window_property('_MY_TAG')").unwrap(), "");
        assert_eq!(h.fake.requests().last(), Some(&Request::DeleteProperty(1, "_MY_TAG".to_owned())));

        let err = h.exec("set_window_property('_MY_TAG', {})").unwrap_err().to_string();
        assert!(err.contains("set_window_property: Two indata expected"), "{}", err);
        let err = h.exec("get_window_property(1)").unwrap_err().to_string();
        assert!(err.contains("get_window_property: String expected as indata"), "{}", err);
    }
}
