use bitflags::bitflags;

bitflags! {
    /// What the engine may do with a property.
    ///
    /// Flags are derived from the accessors a property was built with:
    ///
    /// | accessor        | flags                                 |
    /// |-----------------|---------------------------------------|
    /// | getter          | `WRITABLE`, `VIEWABLE`                |
    /// | setter          | `READABLE`                            |
    /// | getter + setter | all of the above, `EDITABLE`, `CLONABLE` |
    ///
    /// `READABLE` means the value can be read *from an archive* into the
    /// object, `WRITABLE` that it can be written *to an archive*.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct AccessFlags: u8 {
        const READABLE = 1 << 0;
        const WRITABLE = 1 << 1;
        const VIEWABLE = 1 << 2;
        const EDITABLE = 1 << 3;
        const CLONABLE = 1 << 4;
    }
}

impl AccessFlags {
    /// Derives the flags from the presence of a getter and a setter.
    pub const fn derive(has_getter: bool, has_setter: bool) -> Self {
        let mut bits = 0;
        if has_getter {
            bits |= Self::WRITABLE.bits() | Self::VIEWABLE.bits();
        }
        if has_setter {
            bits |= Self::READABLE.bits();
        }
        if has_getter && has_setter {
            bits |= Self::EDITABLE.bits() | Self::CLONABLE.bits();
        }
        Self::from_bits_retain(bits)
    }
}

#[cfg(test)]
mod tests {
    use super::AccessFlags;

    #[test]
    fn derived_flags() {
        assert_eq!(AccessFlags::derive(false, false), AccessFlags::empty());
        assert_eq!(
            AccessFlags::derive(true, false),
            AccessFlags::WRITABLE | AccessFlags::VIEWABLE
        );
        assert_eq!(AccessFlags::derive(false, true), AccessFlags::READABLE);
        assert_eq!(AccessFlags::derive(true, true), AccessFlags::all());
    }
}
