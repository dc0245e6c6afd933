use dt_core::item::{Capture, FunctionValue, Item};
use dt_core::runtime::{convert_block, ItemConverter, RtScope};
use dt_core::Result;

/// Converter for the body of a function value.
///
/// A free identifier naming a capture is written as the item captured when the function was
/// created, never as a read of outer live storage. Everything else goes to `outer`.
pub struct ClosureConverter<'c> {
    captures: &'c [Capture],
    outer: &'c mut dyn ItemConverter,
}

impl<'c> ClosureConverter<'c> {
    pub fn new(captures: &'c [Capture], outer: &'c mut dyn ItemConverter) -> Self {
        Self { captures, outer }
    }
}

impl ItemConverter for ClosureConverter<'_> {
    fn convert_item(&mut self, item: &Item) -> Result<String> {
        self.outer.convert_item(item)
    }

    fn convert_free_ident(&mut self, name: &str) -> Result<String> {
        match self.captures.iter().find(|capture| capture.name == name) {
            Some(capture) => self.outer.convert_item(&capture.item),
            None => self.outer.convert_free_ident(name),
        }
    }
}

/// Function expression for `func`; captured items are written through `outer`.
pub fn render_function(func: &FunctionValue, outer: &mut dyn ItemConverter) -> Result<String> {
    let mut closure = ClosureConverter::new(&func.captures, outer);
    let root = RtScope::root();
    let named = !func.name.is_empty();
    let locals = func
        .params
        .iter()
        .cloned()
        .chain(named.then(|| func.name.clone()));
    let scope = RtScope::child(&root, locals);
    let body = convert_block(&func.body, &mut closure, &scope)?;
    let header = if named {
        format!("function {}({})", func.name, func.params.join(", "))
    } else {
        format!("function ({})", func.params.join(", "))
    };
    if body.is_empty() {
        Ok(format!("{} {{}}", header))
    } else {
        Ok(format!("{} {{ {} }}", header, body.join(" ")))
    }
}
