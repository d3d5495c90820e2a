use convert_case::{Case, Casing};
use syn::{Fields, Ident, ItemStruct, LitStr, Type, ext::IdentExt, parse::ParseBuffer};

pub(crate) struct FieldMetadata {
    pub(crate) ident: Ident,
    pub(crate) ty: Type,
    /// Parameter or column name the field binds to.
    pub(crate) name: String,
    pub(crate) ignore: bool,
}

pub(crate) struct StructMetadata<'a> {
    pub(crate) item: &'a ItemStruct,
    pub(crate) fields: Vec<FieldMetadata>,
}

fn decode_case(value: &str) -> Case<'static> {
    match value {
        "lowercase" => Case::Flat,
        "UPPERCASE" => Case::UpperFlat,
        "camelCase" => Case::Camel,
        "PascalCase" => Case::Pascal,
        "snake_case" => Case::Snake,
        "SCREAMING_SNAKE_CASE" => Case::UpperSnake,
        "kebab-case" => Case::Kebab,
        _ => panic!(
            "Unknown case `{}` in `rename_all`, expected one of: lowercase, UPPERCASE, camelCase, PascalCase, snake_case, SCREAMING_SNAKE_CASE, kebab-case",
            value
        ),
    }
}

fn decode_rename_all(item: &ItemStruct) -> Option<Case<'static>> {
    let mut case = None;
    for attr in &item.attrs {
        let meta = &attr.meta;
        if !meta.path().is_ident("conduit") {
            continue;
        }
        let Ok(list) = meta.require_list() else {
            panic!("Error while parsing `conduit`, use it like: `#[conduit(rename_all = \"PascalCase\")]`");
        };
        let _ = list.parse_nested_meta(|arg| {
            if arg.path.is_ident("rename_all") {
                let Ok(v) = arg.value().and_then(ParseBuffer::parse::<LitStr>) else {
                    panic!("Error while parsing `rename_all`, use it like: `#[conduit(rename_all = \"PascalCase\")]`");
                };
                case = Some(decode_case(&v.value()));
            } else {
                panic!(
                    "Unknown attribute `{}` on a struct, only `rename_all` is supported",
                    arg.path.get_ident().map(Ident::to_string).unwrap_or_default()
                );
            }
            Ok(())
        });
    }
    case
}

pub(crate) fn decode_fields(item: &ItemStruct) -> StructMetadata<'_> {
    let Fields::Named(named) = &item.fields else {
        panic!(
            "`{}` must have named fields to derive its bindings",
            item.ident
        );
    };
    let case = decode_rename_all(item);
    let fields = named
        .named
        .iter()
        .map(|field| {
            let Some(ident) = field.ident.clone() else {
                panic!("Field is expected to have a name");
            };
            let default_name = ident.unraw().to_string();
            let mut metadata = FieldMetadata {
                ident,
                ty: field.ty.clone(),
                name: match &case {
                    Some(case) => default_name.to_case(case.clone()),
                    None => default_name,
                },
                ignore: false,
            };
            for attr in &field.attrs {
                let meta = &attr.meta;
                if !meta.path().is_ident("conduit") {
                    continue;
                }
                let Ok(list) = meta.require_list() else {
                    panic!("Error while parsing `conduit`, use it like: `#[conduit(attribute = value, ...)]`");
                };
                let _ = list.parse_nested_meta(|arg| {
                    if arg.path.is_ident("name") {
                        let Ok(v) = arg.value().and_then(ParseBuffer::parse::<LitStr>) else {
                            panic!("Error while parsing `name`, use it like: `#[conduit(name = \"OrderId\")]`");
                        };
                        metadata.name = v.value();
                    } else if arg.path.is_ident("ignore") {
                        let Err(..) = arg.value() else {
                            panic!("Error while parsing `ignore`, use it like: `#[conduit(ignore)]`");
                        };
                        metadata.ignore = true;
                    } else {
                        panic!(
                            "Unknown attribute `{}` on field `{}`",
                            arg.path.get_ident().map(Ident::to_string).unwrap_or_default(),
                            metadata.ident
                        );
                    }
                    Ok(())
                });
            }
            metadata
        })
        .collect();
    StructMetadata { item, fields }
}
