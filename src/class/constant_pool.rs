use cesu8::from_java_cesu8;
use log::warn;
use std::borrow::Cow;

pub const CONSTANT_UTF8: u8 = 1;
pub const CONSTANT_INTEGER: u8 = 3;
pub const CONSTANT_FLOAT: u8 = 4;
pub const CONSTANT_LONG: u8 = 5;
pub const CONSTANT_DOUBLE: u8 = 6;
pub const CONSTANT_CLASS: u8 = 7;
pub const CONSTANT_STRING: u8 = 8;
pub const CONSTANT_FIELDREF: u8 = 9;
pub const CONSTANT_METHODREF: u8 = 10;
pub const CONSTANT_INTERFACE_METHODREF: u8 = 11;
pub const CONSTANT_NAME_AND_TYPE: u8 = 12;
pub const CONSTANT_METHOD_HANDLE: u8 = 15;
pub const CONSTANT_METHOD_TYPE: u8 = 16;
pub const CONSTANT_DYNAMIC: u8 = 17;
pub const CONSTANT_INVOKE_DYNAMIC: u8 = 18;
pub const CONSTANT_MODULE: u8 = 19;
pub const CONSTANT_PACKAGE: u8 = 20;

/// What a constant pool slot holds, as far as the walker needs to resolve names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Constant
{
    Utf8(String),
    Class(u16),
    Other,
}

/// Fixed payload size after the tag byte, or `None` for `Utf8` and unknown tags.
pub fn payload_size(tag: u8) -> Option<usize>
{
    match tag
    {
        CONSTANT_CLASS | CONSTANT_STRING | CONSTANT_METHOD_TYPE | CONSTANT_MODULE | CONSTANT_PACKAGE => Some(2),
        CONSTANT_METHOD_HANDLE => Some(3),
        CONSTANT_INTEGER | CONSTANT_FLOAT | CONSTANT_FIELDREF | CONSTANT_METHODREF | CONSTANT_INTERFACE_METHODREF
        | CONSTANT_NAME_AND_TYPE | CONSTANT_DYNAMIC | CONSTANT_INVOKE_DYNAMIC => Some(4),
        CONSTANT_LONG | CONSTANT_DOUBLE => Some(8),
        _ => None,
    }
}

pub fn tag_name(tag: u8) -> &'static str
{
    match tag
    {
        CONSTANT_UTF8 => "Utf8",
        CONSTANT_INTEGER => "Integer",
        CONSTANT_FLOAT => "Float",
        CONSTANT_LONG => "Long",
        CONSTANT_DOUBLE => "Double",
        CONSTANT_CLASS => "Class",
        CONSTANT_STRING => "String",
        CONSTANT_FIELDREF => "Fieldref",
        CONSTANT_METHODREF => "Methodref",
        CONSTANT_INTERFACE_METHODREF => "InterfaceMethodref",
        CONSTANT_NAME_AND_TYPE => "NameAndType",
        CONSTANT_METHOD_HANDLE => "MethodHandle",
        CONSTANT_METHOD_TYPE => "MethodType",
        CONSTANT_DYNAMIC => "Dynamic",
        CONSTANT_INVOKE_DYNAMIC => "InvokeDynamic",
        CONSTANT_MODULE => "Module",
        CONSTANT_PACKAGE => "Package",
        _ => "unknown",
    }
}

/// Decodes a modified UTF-8 string; undecodable bytes are replaced.
pub fn decode_utf8(bytes: &[u8]) -> String
{
    match from_java_cesu8(bytes)
    {
        Ok(s) => s.into_owned(),
        Err(_) => {
            warn!("constant pool string is not valid modified UTF-8");
            String::from_utf8_lossy(bytes).into_owned()
        }
    }
}

/// Constant pool slots indexed from 1. Slot 0 and the second half of wide constants stay `None`.
#[derive(Debug, Default)]
pub struct ConstantPool
{
    slots: Vec<Option<Constant>>,
}

impl ConstantPool
{
    pub fn with_count(count: u16) -> Self
    {
        ConstantPool { slots: vec![None; count as usize] }
    }

    pub fn set(&mut self, index: usize, c: Constant)
    {
        if let Some(slot) = self.slots.get_mut(index)
        {
            *slot = Some(c);
        }
    }

    pub fn utf8(&self, index: u16) -> Option<&str>
    {
        match self.slots.get(index as usize)
        {
            Some(Some(Constant::Utf8(s))) => Some(s),
            _ => None,
        }
    }

    /// Resolves an index to a display string, falling back to `#index`.
    pub fn utf8_or_index(&self, index: u16) -> Cow<'_, str>
    {
        match self.utf8(index)
        {
            Some(s) => Cow::Borrowed(s),
            None => Cow::Owned(format!("#{}", index)),
        }
    }

    /// Name of a `Class` constant.
    pub fn class_name(&self, index: u16) -> Cow<'_, str>
    {
        match self.slots.get(index as usize)
        {
            Some(Some(Constant::Class(name_idx))) => self.utf8_or_index(*name_idx),
            _ if index == 0 => Cow::Borrowed("<none>"),
            _ => Cow::Owned(format!("#{}", index)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_names() {
        let mut cp = ConstantPool::with_count(4);
        cp.set(1, Constant::Utf8("java/lang/Object".to_string()));
        cp.set(2, Constant::Class(1));
        cp.set(3, Constant::Other);
        assert_eq!(cp.class_name(2), "java/lang/Object");
        assert_eq!(cp.class_name(0), "<none>");
        assert_eq!(cp.utf8_or_index(3), "#3");
        assert_eq!(cp.utf8_or_index(9), "#9");
    }

    #[test]
    fn decodes_modified_utf8() {
        // NUL is encoded as two bytes in modified UTF-8
        assert_eq!(decode_utf8(&[0x61, 0xc0, 0x80, 0x62]), "a\u{0}b");
    }

    #[test]
    fn payload_sizes() {
        assert_eq!(payload_size(CONSTANT_LONG), Some(8));
        assert_eq!(payload_size(CONSTANT_METHOD_HANDLE), Some(3));
        assert_eq!(payload_size(CONSTANT_UTF8), None);
        assert_eq!(payload_size(2), None);
    }
}
