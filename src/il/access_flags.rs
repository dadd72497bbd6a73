use bitflags::bitflags;

bitflags! {
    /// Attributes on types
    ///
    /// Values follow ECMA-335 II.23.1.15. Enums and value types are not flags: they are
    /// recognised by their base type.
    pub struct TypeFlags: u32 {
        const PUBLIC = 0x0000_0001;
        const NESTED_PUBLIC = 0x0000_0002;
        const NESTED_PRIVATE = 0x0000_0003;
        const INTERFACE = 0x0000_0020;
        const ABSTRACT = 0x0000_0080;
        const SEALED = 0x0000_0100;
        const SPECIAL_NAME = 0x0000_0400;
        const BEFORE_FIELD_INIT = 0x0010_0000;
    }
}

bitflags! {
    /// Attributes on methods
    ///
    /// The low three bits are an enumeration of accessibility, not independent flags: use
    /// [`MethodFlags::visibility`] rather than `contains` to query them.
    ///
    /// [0]: ECMA-335 II.23.1.10
    pub struct MethodFlags: u16 {
        const PRIVATE = 0x0001;
        const FAM_AND_ASSEM = 0x0002;
        const ASSEMBLY = 0x0003;
        const FAMILY = 0x0004;
        const FAM_OR_ASSEM = 0x0005;
        const PUBLIC = 0x0006;
        const ACCESS_MASK = 0x0007;
        const STATIC = 0x0010;
        const FINAL = 0x0020;
        const VIRTUAL = 0x0040;
        const HIDE_BY_SIG = 0x0080;
        const NEW_SLOT = 0x0100;
        const ABSTRACT = 0x0400;
        const SPECIAL_NAME = 0x0800;
        const RT_SPECIAL_NAME = 0x1000;
    }
}

bitflags! {
    /// Attributes on fields
    ///
    /// Accessibility is encoded the same way as on methods.
    ///
    /// [0]: ECMA-335 II.23.1.5
    pub struct FieldFlags: u16 {
        const PRIVATE = 0x0001;
        const FAM_AND_ASSEM = 0x0002;
        const ASSEMBLY = 0x0003;
        const FAMILY = 0x0004;
        const FAM_OR_ASSEM = 0x0005;
        const PUBLIC = 0x0006;
        const ACCESS_MASK = 0x0007;
        const STATIC = 0x0010;
        const INIT_ONLY = 0x0020;
        const LITERAL = 0x0040;
    }
}

bitflags! {
    /// Special constraints on generic parameters
    ///
    /// [0]: ECMA-335 II.23.1.7
    pub struct GenericParameterFlags: u16 {
        const REFERENCE_TYPE_CONSTRAINT = 0x0004;
        const NOT_NULLABLE_VALUE_TYPE_CONSTRAINT = 0x0008;
        const DEFAULT_CONSTRUCTOR_CONSTRAINT = 0x0010;
    }
}

/// Member accessibility
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Visibility {
    CompilerControlled,
    Private,
    FamilyAndAssembly,
    Assembly,
    Family,
    FamilyOrAssembly,
    Public,
}

impl Visibility {
    fn from_access_bits(bits: u16) -> Visibility {
        match bits & 0x0007 {
            0x0001 => Visibility::Private,
            0x0002 => Visibility::FamilyAndAssembly,
            0x0003 => Visibility::Assembly,
            0x0004 => Visibility::Family,
            0x0005 => Visibility::FamilyOrAssembly,
            0x0006 => Visibility::Public,
            _ => Visibility::CompilerControlled,
        }
    }
}

impl MethodFlags {
    pub fn visibility(&self) -> Visibility {
        Visibility::from_access_bits(self.bits())
    }

    pub fn is_static(&self) -> bool {
        self.contains(MethodFlags::STATIC)
    }

    pub fn is_virtual(&self) -> bool {
        self.contains(MethodFlags::VIRTUAL)
    }

    pub fn is_abstract(&self) -> bool {
        self.contains(MethodFlags::ABSTRACT)
    }
}

impl FieldFlags {
    pub fn visibility(&self) -> Visibility {
        Visibility::from_access_bits(self.bits())
    }

    pub fn is_static(&self) -> bool {
        self.contains(FieldFlags::STATIC)
    }

    pub fn is_init_only(&self) -> bool {
        self.contains(FieldFlags::INIT_ONLY)
    }
}
