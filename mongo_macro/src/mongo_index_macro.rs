use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::punctuated::Punctuated;
use syn::{parse_macro_input, DeriveInput, LitStr, Token};

struct IndexSpec {
    fields: Vec<String>,
    unique: bool,
    sparse: bool,
    order: i32,
    name: Option<String>,
}

impl IndexSpec {
    fn index_name(&self) -> String {
        match &self.name {
            Some(name) => name.clone(),
            None => self.fields.iter().map(|f| format!("{}_{}", f, self.order)).collect::<Vec<_>>().join("_"),
        }
    }
}

pub fn expand_index_model_provider(input: proc_macro::TokenStream) -> proc_macro::TokenStream {
    let ast = parse_macro_input!(input as DeriveInput);
    let name = &ast.ident;

    let mut specs = vec![];
    for attr in &ast.attrs {
        if !attr.path().is_ident("mongo_index") {
            continue;
        }
        let mut spec = IndexSpec { fields: vec![], unique: false, sparse: false, order: 1, name: None };
        let res = attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("fields") {
                let content;
                syn::parenthesized!(content in meta.input);
                let list = Punctuated::<LitStr, Token![,]>::parse_terminated(&content)?;
                spec.fields.extend(list.iter().map(|lit| lit.value()));
            } else if meta.path.is_ident("unique") {
                spec.unique = true;
            } else if meta.path.is_ident("sparse") {
                spec.sparse = true;
            } else if meta.path.is_ident("order") {
                let lit: LitStr = meta.value()?.parse()?;
                if lit.value().eq_ignore_ascii_case("desc") {
                    spec.order = -1;
                }
            } else if meta.path.is_ident("name") {
                let lit: LitStr = meta.value()?.parse()?;
                spec.name = Some(lit.value());
            } else {
                return Err(meta.error("Unsupported #[mongo_index(...)] attribute"));
            }
            Ok(())
        });
        if let Err(e) = res {
            return e.to_compile_error().into();
        }
        if spec.fields.is_empty() {
            return syn::Error::new_spanned(attr, "mongo_index 需要至少一个字段: fields(\"...\")").to_compile_error().into();
        }
        specs.push(spec);
    }

    let index_exprs: Vec<TokenStream2> = specs
        .iter()
        .map(|spec| {
            let fields = &spec.fields;
            let order = spec.order;
            let unique = spec.unique;
            let sparse = spec.sparse;
            let index_name = spec.index_name();
            quote! {
                mongodb::IndexModel::builder()
                    .keys({
                        let mut d = mongodb::bson::doc! {};
                        #( d.insert(#fields, #order); )*
                        d
                    })
                    .options(Some(
                        mongodb::options::IndexOptions::builder()
                            .unique(#unique)
                            .sparse(#sparse)
                            .name(#index_name.to_string())
                            .build(),
                    ))
                    .build()
            }
        })
        .collect();

    let unique_keys: Vec<TokenStream2> = specs
        .iter()
        .filter(|spec| spec.unique)
        .map(|spec| {
            let fields = &spec.fields;
            quote! { vec![#(#fields),*] }
        })
        .collect();

    let gen = quote! {
        impl MongoIndexModelProvider for #name {
            fn index_models() -> Vec<mongodb::IndexModel> {
                vec![
                    #(#index_exprs),*
                ]
            }

            fn unique_keys() -> Vec<Vec<&'static str>> {
                vec![
                    #(#unique_keys),*
                ]
            }
        }
    };

    gen.into()
}
