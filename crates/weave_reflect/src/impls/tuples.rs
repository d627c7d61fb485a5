use alloc::borrow::Cow;
use alloc::format;

use crate::info::TypeInfo;
use crate::registry::{GetTypeInfo, ReflectValue, StructBuilder, TypeRegistry};

// Pairs and tuples are reflected as structs, so they travel through archives
// as objects with one named child per element.

impl<A: ReflectValue, B: ReflectValue> GetTypeInfo for (A, B) {
    fn type_name() -> Cow<'static, str> {
        Cow::Owned(format!("({}, {})", A::type_name(), B::type_name()))
    }

    fn type_info(registry: &mut TypeRegistry) -> TypeInfo {
        StructBuilder::<Self>::new(registry)
            .field("first", |p| &p.0, |p| &mut p.0)
            .field("second", |p| &p.1, |p| &mut p.1)
            .build()
    }
}

macro_rules! impl_tuple {
    ($($name:ident : $index:tt),+) => {
        impl<$($name: ReflectValue),+> GetTypeInfo for ($($name,)+) {
            fn type_name() -> Cow<'static, str> {
                let names = [$($name::type_name()),+];
                Cow::Owned(format!("({})", names.join(", ")))
            }

            fn type_info(registry: &mut TypeRegistry) -> TypeInfo {
                StructBuilder::<Self>::new(registry)
                    $(.field(
                        concat!("item", stringify!($index)),
                        |t| &t.$index,
                        |t| &mut t.$index,
                    ))+
                    .build()
            }
        }
    };
}

impl_tuple!(A: 0, B: 1, C: 2);
impl_tuple!(A: 0, B: 1, C: 2, D: 3);
impl_tuple!(A: 0, B: 1, C: 2, D: 3, E: 4);
impl_tuple!(A: 0, B: 1, C: 2, D: 3, E: 4, F: 5);

#[cfg(test)]
mod tests {
    use alloc::string::String;
    use alloc::vec::Vec;

    use crate::TypeRegistry;

    #[test]
    fn element_names() {
        let mut registry = TypeRegistry::new();
        registry.register::<(u8, String)>();
        registry.register::<(bool, u8, i64)>();

        let pair = registry.get_with_name("(u8, String)").unwrap().as_struct().unwrap();
        let names: Vec<_> = pair.properties().iter().map(|p| p.name()).collect();
        assert_eq!(names, ["first", "second"]);

        let triple = registry.get_with_name("(bool, u8, i64)").unwrap().as_struct().unwrap();
        let names: Vec<_> = triple.properties().iter().map(|p| p.name()).collect();
        assert_eq!(names, ["item0", "item1", "item2"]);
    }
}
