use std::fmt::{Display, Formatter};
use std::str::FromStr;
use anyhow::{anyhow, bail, Context, Error};
use serde::{Deserialize, Serialize};

/// A method signature, in the `<class-name: return-type method-name(param-types)>` form used
/// throughout the callgraph data (both as a node label and as a sink/entry-point key).
///
/// ```
/// use std::str::FromStr;
/// # use pretty_assertions::assert_eq;
/// use vpa_sig::signature::Signature;
/// let sig = Signature::from_str("<com.ex.A: void sink(java.lang.String)>").unwrap();
/// assert_eq!(sig.class, "com.ex.A");
/// assert_eq!(sig.return_type, "void");
/// assert_eq!(sig.method, "sink");
/// assert_eq!(sig.params, "java.lang.String");
/// assert_eq!(sig.to_string(), "<com.ex.A: void sink(java.lang.String)>");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Signature {
	pub class: String,
	pub return_type: String,
	pub method: String,
	/// Raw, comma-separated parameter type list, exactly as it appears between the parentheses.
	pub params: String,
}

impl Display for Signature {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		write!(f, "<{}: {} {}({})>", self.class, self.return_type, self.method, self.params)
	}
}

impl FromStr for Signature {
	type Err = Error;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let inner = s.strip_prefix('<').and_then(|s| s.strip_suffix('>'))
			.with_context(|| anyhow!("expected signature wrapped in \"<...>\", got {s:?}"))?;

		let (class, rest) = inner.split_once(": ")
			.with_context(|| anyhow!("expected \": \" after the class name, got {s:?}"))?;

		let (return_type, rest) = rest.split_once(' ')
			.with_context(|| anyhow!("expected a space between return type and method name, got {s:?}"))?;

		let method_and_params = rest.strip_suffix(')')
			.with_context(|| anyhow!("expected method call to end in \")\", got {s:?}"))?;
		let (method, params) = method_and_params.split_once('(')
			.with_context(|| anyhow!("expected \"(\" before the parameter list, got {s:?}"))?;

		if class.is_empty() || method.is_empty() {
			bail!("class name and method name must be non-empty, got {s:?}");
		}

		Ok(Signature {
			class: class.to_owned(),
			return_type: return_type.to_owned(),
			method: method.to_owned(),
			params: params.to_owned(),
		})
	}
}

/// Visibility of a method, as reported by the callgraph generator for each node.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Modifier {
	Public,
	Protected,
	Package,
	Private,
}

impl Modifier {
	/// Whether a method with this modifier can act as an externally reachable entry point:
	/// `public` or `protected`.
	pub fn is_externally_reachable(self) -> bool {
		matches!(self, Modifier::Public | Modifier::Protected)
	}
}

impl Display for Modifier {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		Display::fmt(match self {
			Modifier::Public => "public",
			Modifier::Protected => "protected",
			Modifier::Package => "package",
			Modifier::Private => "private",
		}, f)
	}
}

impl FromStr for Modifier {
	type Err = Error;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Ok(match s {
			"public" => Modifier::Public,
			"protected" => Modifier::Protected,
			"package" => Modifier::Package,
			"private" => Modifier::Private,
			other => bail!("unknown modifier {other:?}, expected one of public/protected/package/private"),
		})
	}
}

#[cfg(test)]
mod tests {
	use pretty_assertions::assert_eq;
	use super::*;

	#[test]
	fn parses_no_arg_signature() {
		let sig = Signature::from_str("<com.ex.dep.B: public void entry()>");
		// note: "public" here is not a return type in real bytecode signatures, but the parser
		// doesn't validate return-type vocabulary, only shape - this exercises the empty-params case
		let sig = sig.unwrap();
		assert_eq!(sig.params, "");
		assert_eq!(sig.method, "entry");
	}

	#[test]
	fn parses_multi_param_signature() {
		let sig = Signature::from_str("<com.ex.A: void sink(int,java.lang.String)>").unwrap();
		assert_eq!(sig.params, "int,java.lang.String");
	}

	#[test]
	fn rejects_missing_brackets() {
		assert!(Signature::from_str("com.ex.A: void sink()").is_err());
	}

	#[test]
	fn modifier_reachability() {
		assert!(Modifier::Public.is_externally_reachable());
		assert!(Modifier::Protected.is_externally_reachable());
		assert!(!Modifier::Package.is_externally_reachable());
		assert!(!Modifier::Private.is_externally_reachable());
	}
}
