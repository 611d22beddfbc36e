use bitflags::bitflags;

bitflags! {
    /// Class, field and method access flags. Some bits mean different things per context.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct AccessFlags: u16 {
        const PUBLIC = 0x0001;
        const PRIVATE = 0x0002;
        const PROTECTED = 0x0004;
        const STATIC = 0x0008;
        const FINAL = 0x0010;
        const SUPER_OR_SYNCHRONIZED = 0x0020;
        const VOLATILE_OR_BRIDGE = 0x0040;
        const TRANSIENT_OR_VARARGS = 0x0080;
        const NATIVE = 0x0100;
        const INTERFACE = 0x0200;
        const ABSTRACT = 0x0400;
        const STRICT = 0x0800;
        const SYNTHETIC = 0x1000;
        const ANNOTATION = 0x2000;
        const ENUM = 0x4000;
        const MODULE = 0x8000;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlagContext
{
    Class,
    Field,
    Method,
}

const NAMES: &[(AccessFlags, &[FlagContext], &str)] = &[
    (AccessFlags::PUBLIC, &[FlagContext::Class, FlagContext::Field, FlagContext::Method], "public"),
    (AccessFlags::PRIVATE, &[FlagContext::Field, FlagContext::Method], "private"),
    (AccessFlags::PROTECTED, &[FlagContext::Field, FlagContext::Method], "protected"),
    (AccessFlags::STATIC, &[FlagContext::Field, FlagContext::Method], "static"),
    (AccessFlags::FINAL, &[FlagContext::Class, FlagContext::Field, FlagContext::Method], "final"),
    (AccessFlags::SUPER_OR_SYNCHRONIZED, &[FlagContext::Class], "super"),
    (AccessFlags::SUPER_OR_SYNCHRONIZED, &[FlagContext::Method], "synchronized"),
    (AccessFlags::VOLATILE_OR_BRIDGE, &[FlagContext::Field], "volatile"),
    (AccessFlags::VOLATILE_OR_BRIDGE, &[FlagContext::Method], "bridge"),
    (AccessFlags::TRANSIENT_OR_VARARGS, &[FlagContext::Field], "transient"),
    (AccessFlags::TRANSIENT_OR_VARARGS, &[FlagContext::Method], "varargs"),
    (AccessFlags::NATIVE, &[FlagContext::Method], "native"),
    (AccessFlags::INTERFACE, &[FlagContext::Class], "interface"),
    (AccessFlags::ABSTRACT, &[FlagContext::Class, FlagContext::Method], "abstract"),
    (AccessFlags::STRICT, &[FlagContext::Method], "strictfp"),
    (AccessFlags::SYNTHETIC, &[FlagContext::Class, FlagContext::Field, FlagContext::Method], "synthetic"),
    (AccessFlags::ANNOTATION, &[FlagContext::Class], "annotation"),
    (AccessFlags::ENUM, &[FlagContext::Class, FlagContext::Field], "enum"),
    (AccessFlags::MODULE, &[FlagContext::Class], "module"),
];

impl AccessFlags
{
    /// Space separated flag names, with bits that mean nothing in `context` shown in hex.
    pub fn describe(bits: u16, context: FlagContext) -> String
    {
        let flags = AccessFlags::from_bits_retain(bits);
        let mut names = vec![];
        let mut known = AccessFlags::empty();
        for (flag, contexts, name) in NAMES
        {
            if flags.contains(*flag) && contexts.contains(&context)
            {
                names.push(name.to_string());
                known |= *flag;
            }
        }
        let unknown = flags.bits() & !known.bits();
        if unknown != 0
        {
            names.push(format!("0x{:04x}", unknown));
        }
        names.join(" ")
    }
}
